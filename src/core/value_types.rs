// src/core/value_types.rs

//! Capability classification. Every component is exactly one of: a command
//! (callable, consumes arguments), a value (printed as-is) or a group
//! (navigated into by member access).

use crate::models::Component;

pub fn is_command(component: &Component) -> bool {
    matches!(component, Component::Routine(_) | Component::Class(_))
}

pub fn is_value(component: &Component) -> bool {
    matches!(
        component,
        Component::None
            | Component::Bool(_)
            | Component::Int(_)
            | Component::Float(_)
            | Component::Complex(..)
            | Component::Ellipsis
            | Component::NotImplemented
            | Component::Str(_)
    ) || has_custom_str(component)
}

pub fn is_group(component: &Component) -> bool {
    !is_command(component) && !is_value(component)
}

/// True when the component overrides its textual form. Primitives count,
/// since their text is their value.
pub fn has_custom_str(component: &Component) -> bool {
    match component {
        Component::Object(object) => object.has_custom_str(),
        Component::List(_)
        | Component::Tuple(_)
        | Component::Set(_)
        | Component::Dict(_)
        | Component::Record(_)
        | Component::Routine(_)
        | Component::Class(_) => false,
        _ => true,
    }
}

/// A map is simple when every value is a value, a list or a map.
/// Simple maps print as an aligned `key: value` table.
pub fn is_simple_group(entries: &[(Component, Component)]) -> bool {
    entries.iter().all(|(_, value)| match value {
        Component::Dict(_) | Component::List(_) => true,
        other => is_value(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Class, Object, Routine, Signature};

    #[test]
    fn test_partition_is_exclusive() {
        let samples: Vec<Component> = vec![
            Component::None,
            1.into(),
            "text".into(),
            Component::list(vec![]),
            Component::dict(vec![]),
            Object::new("Plain").into(),
            Object::new("Shown").describe(|| "shown".into()).into(),
            Routine::function("f", Signature::new(), |_| Ok(Component::None)).into(),
            Class::without_init("C", || Ok(Component::None)).into(),
        ];
        for sample in &samples {
            let hits = [is_command(sample), is_value(sample), is_group(sample)]
                .iter()
                .filter(|b| **b)
                .count();
            assert_eq!(hits, 1, "{:?}", sample);
        }
    }

    #[test]
    fn test_classification() {
        assert!(is_value(&Component::Int(3)));
        assert!(is_value(&Object::new("Shown").describe(|| "x".into()).into()));
        assert!(is_group(&Component::list(vec![1.into()])));
        assert!(is_group(&Object::new("Plain").into()));
        assert!(is_command(&Class::record("Point", &["x"]).into()));
    }

    #[test]
    fn test_simple_groups() {
        let simple = vec![
            ("a".into(), 1.into()),
            ("b".into(), Component::list(vec![1.into()])),
            ("c".into(), Component::dict(vec![])),
        ];
        assert!(is_simple_group(&simple));

        let nested = vec![(
            "a".into(),
            Component::dict(vec![("b".into(), 1.into())]),
        )];
        assert!(is_simple_group(&nested));

        let object = vec![("a".into(), Object::new("O").member("x", 1).into())];
        assert!(!is_simple_group(&object));
    }
}
