//! Built-in rule packages.
//!
//! Each package exposes pure `rules()` (and, where it has any, `cross_rules()`)
//! functions. [`builtin_registry`] is the only place they are assembled.

pub mod ec2;
pub mod eks;
pub mod rds;
pub mod s3;
pub mod tags;

use crate::model::resource::Attributes;
use crate::model::value::ConfigValue;
use crate::rules::registry::Registry;

/// Registry holding every built-in rule, package by package.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .extend(s3::rules())
        .extend(ec2::rules())
        .extend(rds::rules())
        .extend(eks::rules())
        .extend(tags::rules())
        .extend_cross(eks::cross_rules());
    registry
}

/// Boolean setting with the provider default applied when absent.
///
/// `None` when the value is an unresolved expression or not a boolean.
pub(crate) fn bool_setting<A: Attributes + ?Sized>(
    a: &A,
    name: &str,
    default: bool,
) -> Option<bool> {
    match a.get_attr(name) {
        None | Some(ConfigValue::Null) => Some(default),
        Some(ConfigValue::Bool(b)) => Some(*b),
        Some(_) => None,
    }
}

/// String attribute, unless it is an unresolved expression.
pub(crate) fn literal_str<'a, A: Attributes + ?Sized>(a: &'a A, name: &str) -> Option<&'a str> {
    a.get_attr(name)
        .filter(|v| !v.is_unresolved())
        .and_then(ConfigValue::as_str)
}

/// Literal strings of a list attribute. Unresolved elements are left out.
///
/// `None` when the attribute is absent, unresolved or not a list.
pub(crate) fn literal_strings<'a, A: Attributes + ?Sized>(
    a: &'a A,
    name: &str,
) -> Option<Vec<&'a str>> {
    let items = a.get_list_attr(name)?;
    Some(
        items
            .iter()
            .filter(|v| !v.is_unresolved())
            .filter_map(ConfigValue::as_str)
            .collect(),
    )
}

/// Instance family of an EC2 / RDS instance type (`m5.large` → `m5`, `db.r5.large` → `r5`).
pub(crate) fn instance_family(instance_type: &str) -> &str {
    let trimmed = instance_type.strip_prefix("db.").unwrap_or(instance_type);
    trimmed.split('.').next().unwrap_or(trimmed)
}
