//! Reading and writing plain structs with automatic mapping.
//!
//! Run with: cargo run --example simple

use csv_classmap::{from_str, impl_record, to_string};
use std::error::Error;

#[derive(Debug, Default, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: Option<String>,
}

impl_record!(User {
    id: u32 => "Id",
    name: String => "Name",
    email: Option<String> => "Email",
});

fn main() -> Result<(), Box<dyn Error>> {
    let users = vec![
        User {
            id: 42,
            name: "Alice Johnson".to_string(),
            email: Some("alice@example.com".to_string()),
        },
        User {
            id: 43,
            name: "Smith, Bob".to_string(),
            email: None,
        },
    ];

    let csv = to_string(&users)?;
    println!("CSV output:\n{}", csv);

    let users_back: Vec<User> = from_str(&csv)?;
    assert_eq!(users, users_back);
    println!("✓ Round-trip successful");

    // Column order in the input does not matter
    let reordered: Vec<User> = from_str("Email,Name,Id\n,Carol,44\n")?;
    println!("Read with reordered header: {:?}", reordered);

    Ok(())
}
