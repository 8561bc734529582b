//! Case transform between script keys and host member names
//!
//! Script code sees lower-camel names (`firstName`); host fields and methods
//! are registered title-case (`FirstName`). Only the first character changes,
//! so a name enumerated to script resolves again with the same string.
//!
//! A host name is *exported* when lower-casing it changes it. Names starting
//! with a lowercase letter, a digit or `_` are unexported and stay invisible.

/// Script key to host member name (`firstName` -> `FirstName`)
pub fn to_host_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Host member name to script key (`FirstName` -> `firstName`)
pub fn to_script_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Check whether a host member name is visible to script
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
