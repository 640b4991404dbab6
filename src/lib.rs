//! `argot` turns a command line — a flat sequence of string tokens — into a populated,
//! strongly typed configuration, and renders the matching usage screen from the same
//! declarations.
//!
//! Unlike derive-first argument parsers, `argot` deliberately splits the problem at a
//! neutral seam: the host describes its parameters as [`ParameterSpec`] values gathered
//! into a [`CommandModel`], and parsed values flow out through the [`Sink`] write
//! interface.  Any declaration mechanism — a builder, a configuration table, generated
//! code — can sit in front; any storage — a typed struct, a map, a scripting shim — can
//! sit behind.  The crate owns the hard middle:
//! * The token matching grammar: long and short names with no fixed prefix character,
//!   clustered short flags (`-rvf`), separator-attached values (`-o=file`, configurable
//!   separator), short-form attachment (`-ofile`), variable arities with unconditional
//!   minimums, boolean options that only take a value when one is actually present, the
//!   `--` end-of-options terminator, and a single positional parameter.
//! * Type conversion through an extensible [`ConverterRegistry`], with built-ins for the
//!   primitive, textual, network, temporal and pattern types.
//! * Usage rendering: a synthesized synopsis (compact or detailed) plus an aligned
//!   option table with per-column overflow policies.
//!
//! # Usage
//! ```
//! use argot::{ArityRange, CommandModel, ParameterSpec, ScalarType, Value, ValueShape};
//!
//! let model = CommandModel::builder()
//!     .program("copy")
//!     .add(
//!         ParameterSpec::option(["-v", "--verbose"], "verbose", ValueShape::Scalar(ScalarType::Bool))
//!             .describe("Explain what is being done."),
//!     )
//!     .add(ParameterSpec::option(["-o"], "output", ValueShape::Scalar(ScalarType::Path)).required())
//!     .add(
//!         ParameterSpec::positional("sources", ValueShape::Sequence(ScalarType::Path))
//!             .arity(ArityRange::at_least(1)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let config = argot::parse_to_map(&model, &["-vo", "dest", "a.txt", "b.txt"]).unwrap();
//! assert_eq!(config.scalar("verbose"), Some(&Value::Bool(true)));
//! assert_eq!(config.sequence("sources").unwrap().len(), 2);
//! ```
//!
//! Rendering help for the same model is a pure read:
//! ```
//! # use argot::{CommandModel, ParameterSpec, ScalarType, ValueShape};
//! # let model = CommandModel::builder().program("copy").build().unwrap();
//! let mut screen = String::new();
//! argot::usage(&model, &mut screen).unwrap();
//! assert!(screen.starts_with("Usage: copy"));
//! ```
//!
//! # Errors
//! Every failure is a [`ParameterError`]; parsing never panics and never returns a partial
//! result.  Conversion failures keep the offending token and the parameter's primary name
//! so the message is actionable as-is.
mod command;
mod constant;
mod convert;
mod error;
mod help;
mod model;
mod parser;
mod sink;

pub use command::{CommandModel, ModelBuilder};
pub use convert::{ConvertError, ConverterRegistry, ScalarType, Value};
pub use error::ParameterError;
pub use help::{usage, Column, Help, OptionSort, Overflow, TextTable};
pub use model::{ArityRange, InvalidArity, ParameterKind, ParameterSpec, ValueShape};
pub use parser::{parse, parse_to_map, CommandLine};
pub use sink::{Captured, Sink, ValueMap};

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

#[cfg(test)]
pub(crate) mod test {
    macro_rules! assert_contains {
        ($base:expr, $sub:expr) => {
            assert!(
                $base.contains($sub),
                "'{b}' does not contain '{s}'",
                b = $base,
                s = $sub,
            );
        };
    }

    pub(crate) use assert_contains;
}
