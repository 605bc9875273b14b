// src/bin/ignite.rs

//! A sample component graph exposed on the command line.
//!
//! ```text
//! ignite calculator --offset=1 add 2 3
//! ignite widget whack 3
//! ignite constants pi
//! ignite colors 1
//! ignite -- --help
//! ```

use anyhow::{Result, anyhow};
use colored::Colorize;
use ignite::{CallArgs, Class, Component, Fire, FireError, Object, Routine, Signature, logged, t};
use std::rc::Rc;

fn number(args: &CallArgs, name: &str) -> Result<f64> {
    let value = args.require(name)?;
    value
        .as_f64()
        .ok_or_else(|| anyhow!("'{}' is not a number: {}", name, value))
}

fn calculator() -> Class {
    Class::new(
        "Calculator",
        Signature::new().param_default("offset", 0),
        |args| {
            let offset = number(&args, "offset")?;
            Ok(Object::new("Calculator")
                .with_doc("A calculator that adds a fixed offset to every result.")
                .member("offset", offset)
                .member(
                    "add",
                    Routine::method("add", Signature::new().param("x").param("y"), move |args| {
                        Ok((number(&args, "x")? + number(&args, "y")? + offset).into())
                    })
                    .with_doc("Adds two numbers.\n\nArgs:\n  x: The first number.\n  y: The second number.\n"),
                )
                .member(
                    "divide",
                    logged(
                        Rc::new(
                            Routine::method("divide", Signature::new().param("x").param("y"), move |args| {
                                let divisor = number(&args, "y")?;
                                if divisor == 0.0 {
                                    return Err(anyhow!("division by zero"));
                                }
                                Ok((number(&args, "x")? / divisor + offset).into())
                            })
                            .with_doc("Divides x by y."),
                        ),
                        "error",
                    )?,
                )
                .into())
        },
    )
    .with_doc("Arithmetic from the command line.\n\nArgs:\n  offset: Added to every result.\n")
    .with_source(file!(), line!())
}

fn widget() -> Object {
    Object::new("Widget")
        .with_doc("A widget that makes noise.")
        .member(
            "whack",
            Routine::method("whack", Signature::new().param_default("n", 1), |args| {
                let times = args.get("n").and_then(Component::as_i64).unwrap_or(1).max(0);
                Ok(vec!["whack!"; usize::try_from(times).unwrap_or_default()].join(" ").into())
            })
            .with_doc("Whacks n times."),
        )
        .member(
            "bang",
            Routine::method(
                "bang",
                Signature::new().param_default("noise", "bang"),
                |args| Ok(format!("{} bang!", args.require("noise")?).into()),
            ),
        )
}

fn graph() -> Component {
    Object::new("Demo")
        .with_doc("ignite demo: every token walks one step into this graph.")
        .member("calculator", calculator())
        .member("widget", widget())
        .member(
            "constants",
            Component::dict(vec![
                ("pi".into(), Component::Float(std::f64::consts::PI)),
                ("e".into(), Component::Float(std::f64::consts::E)),
                ("answer".into(), Component::Int(42)),
            ]),
        )
        .member(
            "colors",
            Component::list(vec!["red".into(), "green".into(), "blue".into()]),
        )
        .into()
}

fn main() {
    env_logger::init();

    match Fire::new(graph()).run() {
        Ok(_) => {}
        Err(FireError::Exit { code, .. }) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", format!(t!("bin.error"), error = e).red().bold());
            std::process::exit(e.exit_code());
        }
    }
}
