// src/core/test_components.rs

//! Component graphs shared by the unit tests.

use crate::models::{Class, Component, Object, Record, Routine, Signature};
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
#[error("division by zero")]
pub(crate) struct DivisionByZero;

fn int(value: Option<&Component>) -> i64 {
    value.and_then(Component::as_i64).unwrap_or_default()
}

/// `f(a, b=2)` returning `"{a} {b}"`.
pub(crate) fn f_a_b() -> Component {
    Routine::function("f", Signature::new().param("a").param_default("b", 2), |args| {
        Ok(format!("{} {}", args.require("a")?, args.require("b")?).into())
    })
    .with_doc("Joins its arguments.")
    .into()
}

pub(crate) fn with_defaults() -> Component {
    Object::new("WithDefaults")
        .with_doc("Arithmetic with default counts.")
        .member(
            "double",
            Routine::method("double", Signature::new().param_default("count", 0), |args| {
                Ok((2 * int(args.get("count"))).into())
            })
            .with_doc("Doubles the count.\n\nArgs:\n  count: The input value.\n")
            .with_source("calculator.rs", 12),
        )
        .member(
            "triple",
            Routine::method("triple", Signature::new().param_default("count", 0), |args| {
                Ok((3 * int(args.get("count"))).into())
            }),
        )
        .member(
            "divide",
            Routine::method("divide", Signature::new().param("a").param("b"), |args| {
                let divisor = int(args.get("b"));
                if divisor == 0 {
                    return Err(DivisionByZero.into());
                }
                Ok((int(args.get("a")) / divisor).into())
            }),
        )
        .into()
}

pub(crate) fn underscores() -> Component {
    Object::new("Underscores")
        .member("underscore_example", "fish fingers")
        .member(
            "underscore_function",
            Routine::method(
                "underscore_function",
                Signature::new().param("underscore_arg"),
                |args| Ok(args.require("underscore_arg")?.clone()),
            ),
        )
        .into()
}

pub(crate) fn number_words() -> Component {
    Component::list(
        ["zero", "one", "two", "three"]
            .into_iter()
            .map(Component::from)
            .collect(),
    )
}

pub(crate) fn point(x: i64, y: i64) -> Component {
    Record::new(
        "Point",
        vec![("x".to_string(), x.into()), ("y".to_string(), y.into())],
    )
    .into()
}

/// A class taking `name` whose instances can `greet`.
pub(crate) fn greeter_class() -> Component {
    Class::new("Greeter", Signature::new().param("name"), |args| {
        let name = args.require("name")?.to_string();
        let greeting = format!("Hello, {}!", name);
        Ok(Object::new("Greeter")
            .member("name", name)
            .member(
                "greet",
                Routine::method("greet", Signature::new(), move |_| {
                    Ok(greeting.clone().into())
                }),
            )
            .into())
    })
    .with_doc("Greets people.")
    .into()
}

pub(crate) fn thing_nothing() -> Component {
    Routine::function(
        "bools",
        Signature::new().param("thing").param("nothing"),
        |args| {
            Ok(Component::tuple(vec![
                args.require("thing")?.clone(),
                args.require("nothing")?.clone(),
            ]))
        },
    )
    .into()
}

pub(crate) fn varargs_object() -> Component {
    Object::new("VarArgs")
        .member(
            "cumsums",
            Routine::method("cumsums", Signature::new().varargs("items"), |args| {
                let mut total = 0;
                let sums = args
                    .rest()
                    .iter()
                    .map(|item| {
                        total += item.as_i64().unwrap_or_default();
                        Component::Int(total)
                    })
                    .collect();
                Ok(Component::list(sums))
            }),
        )
        .member(
            "get_obj",
            Routine::method("get_obj", Signature::new().varargs("items"), |_| {
                Ok(Object::new("BoolConverter")
                    .member(
                        "as_bool",
                        Routine::method("as_bool", Signature::new().param("arg"), |args| {
                            Ok(args.require("arg")?.truthy().into())
                        }),
                    )
                    .into())
            }),
        )
        .into()
}

pub(crate) fn empty_class() -> Component {
    Class::without_init("Empty", || Ok(Object::new("Empty").into())).into()
}

/// `child` returns an object whose `grandchild(value)` returns an object
/// holding `double`.
pub(crate) fn nested() -> Component {
    Object::new("Root")
        .member(
            "child",
            Routine::method("child", Signature::new(), |_| {
                Ok(Object::new("Child")
                    .member(
                        "grandchild",
                        Routine::method("grandchild", Signature::new().param("value"), |args| {
                            let value = int(args.get("value"));
                            Ok(Object::new("Grandchild").member("double", value * 2).into())
                        }),
                    )
                    .into())
            }),
        )
        .into()
}

pub(crate) fn takes_help() -> Component {
    Routine::function("takes_help", Signature::new().param("help"), |args| {
        Ok(args.require("help")?.clone())
    })
    .into()
}

pub(crate) fn callable_adder() -> Component {
    Object::new("Adder")
        .member("offset", 1)
        .callable(Routine::method(
            "__call__",
            Signature::new().param_default("x", 0),
            |args| Ok((int(args.get("x")) + 1).into()),
        ))
        .into()
}

pub(crate) fn similar_args() -> Component {
    Routine::function(
        "similar",
        Signature::new()
            .param_default("alpha", Component::None)
            .param_default("gamma", Component::None)
            .param_default("apple", Component::None),
        |args| {
            Ok(Component::tuple(
                ["alpha", "gamma", "apple"]
                    .iter()
                    .map(|name| args.get(name).cloned().unwrap_or(Component::None))
                    .collect(),
            ))
        },
    )
    .into()
}

pub(crate) fn with_private() -> Component {
    Object::new("WithPrivate")
        .member("public", 1)
        .member("_secret", 42)
        .into()
}

/// A small graph mixing every kind of member, for help and completion.
pub(crate) fn mixed() -> Component {
    Object::new("Mixed")
        .with_doc("A mixed bag.")
        .member("count", 3)
        .member("name", "mixer")
        .member("numbers", number_words())
        .member("greeter", greeter_class())
        .member(
            "double",
            Routine::method("double", Signature::new().param_default("count", 0), |args| {
                Ok((2 * int(args.get("count"))).into())
            })
            .with_doc("Doubles the count."),
        )
        .member("_hidden", 0)
        .member("shared", Rc::new(Routine::function("shared", Signature::new(), |_| Ok(Component::None))))
        .into()
}
