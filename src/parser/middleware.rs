use std::fmt;

use crate::command::CommandModel;
use crate::error::ParameterError;
use crate::help;
use crate::parser::base;
use crate::sink::{Sink, ValueMap};

/// One-shot parse: walk `tokens` against `model`, writing converted values through `sink`.
///
/// ### Example
/// ```
/// use argot::{CommandModel, ParameterSpec, ScalarType, Value, ValueMap, ValueShape};
///
/// let model = CommandModel::builder()
///     .add(ParameterSpec::option(["-c", "--count"], "count", ValueShape::Scalar(ScalarType::I32)))
///     .build()
///     .unwrap();
///
/// let mut sink = ValueMap::new();
/// argot::parse(&model, &mut sink, &["-c", "3"]).unwrap();
/// assert_eq!(sink.scalar("count"), Some(&Value::Int(3)));
/// ```
pub fn parse(
    model: &CommandModel,
    sink: &mut dyn Sink,
    tokens: &[&str],
) -> Result<(), ParameterError> {
    base::run(model, sink, tokens)
}

/// One-shot parse into a fresh [`ValueMap`].
pub fn parse_to_map(model: &CommandModel, tokens: &[&str]) -> Result<ValueMap, ParameterError> {
    let mut map = ValueMap::new();
    base::run(model, &mut map, tokens)?;
    Ok(map)
}

/// A reusable parser holding one [`CommandModel`].
///
/// Parsing keeps no state on the `CommandLine` between calls; concurrent parses only need
/// their own [`Sink`] each.  The separator may be re-configured between parses.
pub struct CommandLine {
    model: CommandModel,
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLine{..}").finish()
    }
}

impl CommandLine {
    pub fn new(model: CommandModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &CommandModel {
        &self.model
    }

    pub fn separator(&self) -> &str {
        self.model.separator()
    }

    /// Re-configure the option/value separator.  Rejects the empty string.
    pub fn set_separator(&mut self, separator: impl Into<String>) -> Result<(), ParameterError> {
        let separator = separator.into();

        if separator.is_empty() {
            return Err(ParameterError::illegal("the separator must be non-empty"));
        }

        self.model.set_separator(separator);
        Ok(())
    }

    pub fn parse(&self, sink: &mut dyn Sink, tokens: &[&str]) -> Result<(), ParameterError> {
        base::run(&self.model, sink, tokens)
    }

    pub fn parse_to_map(&self, tokens: &[&str]) -> Result<ValueMap, ParameterError> {
        parse_to_map(&self.model, tokens)
    }

    /// Render the help screen into a character sink.
    pub fn usage(&self, out: &mut dyn fmt::Write) -> Result<(), ParameterError> {
        help::usage(&self.model, out)
    }

    pub fn usage_string(&self) -> Result<String, ParameterError> {
        let mut rendered = String::default();
        self.usage(&mut rendered)?;
        Ok(rendered)
    }
}
