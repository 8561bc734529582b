// #[bridge(...)] attribute parsing

use syn::{Attribute, ExprPath, LitStr, Result};

/// Options on the struct itself
#[derive(Default)]
pub struct ContainerAttrs {
    pub name: Option<LitStr>,
    pub methods: Option<ExprPath>,
}

/// Options on one field
#[derive(Default)]
pub struct FieldAttrs {
    pub skip: bool,
    pub readonly: bool,
    pub record: bool,
    pub rename: Option<LitStr>,
}

pub fn parse_container(attrs: &[Attribute]) -> Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("bridge")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                out.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("methods") {
                out.methods = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `name` or `methods`"))
            }
        })?;
    }
    Ok(out)
}

pub fn parse_field(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("bridge")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else if meta.path.is_ident("readonly") {
                out.readonly = true;
                Ok(())
            } else if meta.path.is_ident("record") {
                out.record = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `skip`, `readonly`, `record` or `rename`"))
            }
        })?;
    }
    Ok(out)
}

/// `first_name` -> `FirstName`
pub fn host_name(field: &str) -> String {
    let field = field.strip_prefix("r#").unwrap_or(field);
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
