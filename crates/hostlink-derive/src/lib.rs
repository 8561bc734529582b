// hostlink-derive: capability tables from struct definitions
//
// Provides #[derive(Bridged)], which registers every public field of a
// struct with the bridge under its title-case host name:
//
// ```
// use hostlink_bridge::Bridged;
//
// #[derive(Bridged, Default)]
// #[bridge(methods = Person::bridge_methods)]
// pub struct Person {
//     pub first_name: String,   // "FirstName", script key "firstName"
//     #[bridge(readonly)]
//     pub id: u64,              // "Id", not assignable
//     #[bridge(record)]
//     pub address: Address,     // nested record, proxied by value
//     #[bridge(skip)]
//     pub cache: Vec<u8>,
//     secret: String,           // private fields are never exposed
// }
// ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod bridged;

/// Derives `hostlink_bridge::Bridged` for a struct with named fields.
///
/// Field attributes:
/// - `#[bridge(skip)]` - do not expose the field
/// - `#[bridge(readonly)]` - expose without a setter
/// - `#[bridge(record)]` - nested `Bridged + Clone` record, exposed by value
/// - `#[bridge(rename = "Name")]` - host name to register instead of the
///   title-cased field name
///
/// Container attributes:
/// - `#[bridge(name = "Type")]` - type name used in diagnostics
/// - `#[bridge(methods = path)]` - `fn(TypeBuilder<Self>) -> TypeBuilder<Self>`
///   registering methods after the fields
#[proc_macro_derive(Bridged, attributes(bridge))]
pub fn derive_bridged(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    bridged::expand_bridged(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
