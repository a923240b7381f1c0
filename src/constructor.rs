//! Constructor selection.
//!
//! A class map drives exactly one constructor of its target type. It is chosen,
//! in order of precedence, from:
//!
//! 1. an explicitly supplied [`ConstructorHandle`], used verbatim;
//! 2. the parameter names declared by parameter maps: the first constructor,
//!    in declaration order, whose parameter names are a superset;
//! 3. the "most parameters" heuristic, skipping synthesized constructors.
//!
//! The heuristic is a convenience, not a guarantee. When two constructors tie
//! for the most parameters the first declared wins and a warning is logged;
//! supply an explicit constructor or parameter names to disambiguate.

use crate::describe::{ConstructorHandle, TypeInfo};
use crate::{Error, Result};

/// Hints available when selecting a constructor.
#[derive(Clone, Copy, Debug)]
pub enum ConstructorHint<'a> {
    Explicit(ConstructorHandle),
    ParameterNames(&'a [&'a str]),
    MostParameters,
}

/// Selects one constructor of `info` according to `hint`.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when no constructor satisfies the hint.
pub fn resolve_constructor<T>(info: &TypeInfo<T>, hint: ConstructorHint<'_>) -> Result<ConstructorHandle> {
    let handle = match hint {
        ConstructorHint::Explicit(handle) => {
            if info.constructor(handle).is_none() {
                return Err(Error::configuration(
                    info.name(),
                    format!("constructor #{} does not exist", handle.index()),
                ));
            }
            handle
        }
        ConstructorHint::ParameterNames(names) => by_parameter_names(info, names)?,
        ConstructorHint::MostParameters => most_parameters(info)?,
    };
    log::debug!(
        "selected constructor #{} of `{}` ({:?})",
        handle.index(),
        info.name(),
        hint
    );
    Ok(handle)
}

/// Finds the first constructor whose parameter names include every name in `names`.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when no constructor accepts all names.
pub fn by_parameter_names<T>(info: &TypeInfo<T>, names: &[&str]) -> Result<ConstructorHandle> {
    info.constructors()
        .iter()
        .position(|ctor| {
            names
                .iter()
                .all(|name| ctor.parameters().iter().any(|p| p.name() == *name))
        })
        .map(ConstructorHandle)
        .ok_or_else(|| {
            Error::configuration(
                info.name(),
                format!("no constructor accepts parameters [{}]", names.join(", ")),
            )
        })
}

/// Picks the non-synthesized constructor with the most parameters.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when the type declares no eligible constructor.
pub fn most_parameters<T>(info: &TypeInfo<T>) -> Result<ConstructorHandle> {
    let mut best: Option<(usize, usize)> = None;
    let mut tied = false;
    for (index, ctor) in info.constructors().iter().enumerate() {
        if ctor.is_synthesized() {
            continue;
        }
        let arity = ctor.parameters().len();
        match best {
            Some((_, best_arity)) if arity == best_arity => tied = true,
            Some((_, best_arity)) if arity < best_arity => {}
            _ => {
                best = Some((index, arity));
                tied = false;
            }
        }
    }

    let (index, arity) = best.ok_or_else(|| {
        Error::configuration(info.name(), "type declares no usable constructor")
    })?;
    if tied {
        log::warn!(
            "`{}` has several constructors with {} parameters; using #{}",
            info.name(),
            arity,
            index
        );
    }
    Ok(ConstructorHandle(index))
}

/// Returns the first parameterless constructor, if the type has one.
pub fn parameterless<T>(info: &TypeInfo<T>) -> Option<ConstructorHandle> {
    info.constructors()
        .iter()
        .position(|ctor| ctor.parameters().is_empty())
        .map(ConstructorHandle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{ConstructorInfo, ParameterInfo};

    struct Sample;

    fn info() -> TypeInfo<Sample> {
        TypeInfo::new("Sample")
            .with_constructor(ConstructorInfo::new(Vec::new(), |_| Ok(Sample)))
            .with_constructor(ConstructorInfo::new(
                vec![ParameterInfo::of::<i32>("id")],
                |_| Ok(Sample),
            ))
            .with_constructor(ConstructorInfo::new(
                vec![
                    ParameterInfo::of::<i32>("id"),
                    ParameterInfo::of::<String>("name"),
                ],
                |_| Ok(Sample),
            ))
            .with_constructor(
                ConstructorInfo::new(
                    vec![
                        ParameterInfo::of::<i32>("a"),
                        ParameterInfo::of::<i32>("b"),
                        ParameterInfo::of::<i32>("c"),
                    ],
                    |_| Ok(Sample),
                )
                .synthesized(),
            )
    }

    #[test]
    fn test_by_parameter_names_takes_first_superset() {
        let info = info();
        assert_eq!(by_parameter_names(&info, &["id"]).unwrap().index(), 1);
        assert_eq!(by_parameter_names(&info, &["name", "id"]).unwrap().index(), 2);
        assert!(by_parameter_names(&info, &["missing"])
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_most_parameters_skips_synthesized() {
        assert_eq!(most_parameters(&info()).unwrap().index(), 2);
    }

    #[test]
    fn test_most_parameters_tie_takes_first_declared() {
        let info = TypeInfo::<Sample>::new("Tied")
            .with_constructor(ConstructorInfo::new(
                vec![ParameterInfo::of::<i32>("x")],
                |_| Ok(Sample),
            ))
            .with_constructor(ConstructorInfo::new(
                vec![ParameterInfo::of::<i32>("y")],
                |_| Ok(Sample),
            ));
        assert_eq!(most_parameters(&info).unwrap().index(), 0);
    }

    #[test]
    fn test_no_constructor_is_configuration_error() {
        let info = TypeInfo::<Sample>::new("Empty");
        assert!(most_parameters(&info).unwrap_err().is_configuration());
        assert!(parameterless(&info).is_none());
    }

    #[test]
    fn test_explicit_handle_is_checked() {
        let info = info();
        let handle = info.constructor_handle(2).unwrap();
        assert_eq!(
            resolve_constructor(&info, ConstructorHint::Explicit(handle)).unwrap(),
            handle
        );
        assert!(resolve_constructor(&info, ConstructorHint::Explicit(ConstructorHandle(9)))
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_parameterless() {
        assert_eq!(parameterless(&info()).unwrap().index(), 0);
    }
}
