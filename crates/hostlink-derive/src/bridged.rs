// #[derive(Bridged)] implementation
//
// Generates a `Bridged::describe` registering each public field.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Error, Fields, LitStr, Result, Visibility};

use crate::attrs::{host_name, parse_container, parse_field};

/// Expands #[derive(Bridged)].
///
/// Example expansion:
/// ```ignore
/// // Input:
/// #[derive(Bridged)]
/// pub struct Person {
///     pub name: String,
///     #[bridge(readonly)]
///     pub id: u64,
/// }
///
/// // Output:
/// impl ::hostlink_bridge::Bridged for Person {
///     fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
///         let builder = builder
///             .field("Name", |this: &Self| -> String { this.name.clone() },
///                            |this: &mut Self, value: String| { this.name = value; })
///             .readonly("Id", |this: &Self| -> u64 { this.id.clone() });
///         builder
///     }
///
///     fn type_name() -> &'static str {
///         "Person"
///     }
/// }
/// ```
pub fn expand_bridged(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "#[derive(Bridged)] does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new_spanned(
                    ident,
                    "#[derive(Bridged)] requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                ident,
                "#[derive(Bridged)] can only be used on structs",
            ))
        }
    };

    let container = parse_container(&input.attrs)?;
    let type_name = container
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    let mut registrations = Vec::new();
    let mut getters = Vec::new();

    for field in fields {
        let attrs = parse_field(&field.attrs)?;
        if attrs.skip || !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let name = attrs
            .rename
            .unwrap_or_else(|| LitStr::new(&host_name(&field_ident.to_string()), field_ident.span()));

        if attrs.record {
            // Named fn so the returned borrow ties to the argument
            let getter = format_ident!("__bridge_get_{}", field_ident);
            getters.push(quote! {
                fn #getter(this: &#ident) -> &#ty {
                    &this.#field_ident
                }
            });
            registrations.push(quote! {
                .record(#name, #getter)
            });
        } else if attrs.readonly {
            registrations.push(quote! {
                .readonly(#name, |this: &Self| -> #ty {
                    ::std::clone::Clone::clone(&this.#field_ident)
                })
            });
        } else {
            registrations.push(quote! {
                .field(
                    #name,
                    |this: &Self| -> #ty { ::std::clone::Clone::clone(&this.#field_ident) },
                    |this: &mut Self, value: #ty| { this.#field_ident = value; },
                )
            });
        }
    }

    let methods = container.methods.map(|path| quote! { let builder = #path(builder); });

    Ok(quote! {
        impl ::hostlink_bridge::Bridged for #ident {
            fn describe(
                builder: ::hostlink_bridge::TypeBuilder<Self>,
            ) -> ::hostlink_bridge::TypeBuilder<Self> {
                #(#getters)*
                let builder = builder #(#registrations)*;
                #methods
                builder
            }

            fn type_name() -> &'static str {
                #type_name
            }
        }
    })
}
