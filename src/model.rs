use std::str::FromStr;

use thiserror::Error;

use crate::convert::ScalarType;

/// The `[min..max]` window of value tokens a parameter consumes.
///
/// `max == None` is the unbounded sentinel (`1..*`); a declared upper bound is always `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArityRange {
    min: usize,
    max: Option<usize>,
}

impl ArityRange {
    /// Precisely `n` values.
    pub fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// At least `min` values, unbounded above.
    pub fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Between `min` and `max` values (inclusive).
    pub fn between(min: usize, max: usize) -> Result<Self, ()> {
        // min ≤ max
        if min <= max {
            Ok(Self {
                min,
                max: Some(max),
            })
        } else {
            Err(())
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Whether the declaration used the unbounded sentinel (`N..*`).
    pub fn is_variable(&self) -> bool {
        self.max.is_none()
    }

    /// A pure flag window: consumes no value tokens at all.
    pub fn is_zero(&self) -> bool {
        self.min == 0 && self.max == Some(0)
    }
}

impl std::fmt::Display for ArityRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{text}' is not a valid arity range.")]
pub struct InvalidArity {
    text: String,
}

impl FromStr for ArityRange {
    type Err = InvalidArity;

    /// Accepts `"N"`, `"N..M"`, `"N..*"`, and the standalone `"*"` (meaning `0..*`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidArity {
            text: value.to_string(),
        };

        if value == "*" {
            return Ok(ArityRange::at_least(0));
        }

        match value.split_once("..") {
            Some((low, high)) => {
                let min: usize = low.parse().map_err(|_| invalid())?;

                if high == "*" {
                    Ok(ArityRange::at_least(min))
                } else {
                    let max: usize = high.parse().map_err(|_| invalid())?;
                    ArityRange::between(min, max).map_err(|_| invalid())
                }
            }
            None => {
                let n: usize = value.parse().map_err(|_| invalid())?;
                Ok(ArityRange::exactly(n))
            }
        }
    }
}

#[cfg(test)]
impl rand::distributions::Distribution<ArityRange> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> ArityRange {
        match rng.gen_range(0..2) {
            0 => {
                let max: u8 = rng.gen();
                ArityRange::between(rng.gen_range(0..=max) as usize, max as usize)
                    .expect("sampled min must not exceed max")
            }
            1 => ArityRange::at_least(rng.gen::<u8>() as usize),
            _ => unreachable!("internal error - impossible gen_range()"),
        }
    }
}

/// Whether a spec is matched by name or by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    NamedOption,
    Positional,
}

/// The target shape of a parameter: one converted value, or a growable sequence of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueShape {
    Scalar(ScalarType),
    Sequence(ScalarType),
}

impl ValueShape {
    /// The per-element conversion target.
    pub fn element(&self) -> &ScalarType {
        match self {
            ValueShape::Scalar(inner) => inner,
            ValueShape::Sequence(inner) => inner,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ValueShape::Sequence(_))
    }
}

/// The neutral description of one option or positional parameter.
///
/// A `ParameterSpec` says nothing about how it was declared (builder, table, code
/// generation) nor where its values land; the [`Sink`](crate::Sink) owns storage, addressed
/// by the spec's `field` name.
///
/// ### Example
/// ```
/// use argot::{ArityRange, ParameterSpec, ScalarType, ValueShape};
///
/// let spec = ParameterSpec::option(["-n", "--dry-run"], "dry_run", ValueShape::Scalar(ScalarType::Bool))
///     .describe("Print the plan without executing it.");
/// assert_eq!(spec.effective_arity(), ArityRange::exactly(0));
/// ```
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    kind: ParameterKind,
    names: Vec<String>,
    field: String,
    shape: ValueShape,
    arity: Option<ArityRange>,
    required: bool,
    label: Option<String>,
    hidden: bool,
    help_flag: bool,
    description: Option<String>,
    pub(crate) order: usize,
}

impl ParameterSpec {
    /// Declare a named option.  Names are matched literally; no prefix character is implied.
    pub fn option(
        names: impl IntoIterator<Item = impl Into<String>>,
        field: impl Into<String>,
        shape: ValueShape,
    ) -> Self {
        Self {
            kind: ParameterKind::NamedOption,
            names: names.into_iter().map(Into::into).collect(),
            field: field.into(),
            shape,
            arity: None,
            required: false,
            label: None,
            hidden: false,
            help_flag: false,
            description: None,
            order: 0,
        }
    }

    /// Declare the positional parameter.
    pub fn positional(field: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            kind: ParameterKind::Positional,
            names: Vec::default(),
            field: field.into(),
            shape,
            arity: None,
            required: false,
            label: None,
            hidden: false,
            help_flag: false,
            description: None,
            order: 0,
        }
    }

    /// Declare a conventional help switch (`-h`, `--help`): a hidden-from-required-checks
    /// boolean flag whose match suppresses the end-of-parse validation.
    pub fn help_option(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::option(names, "help", ValueShape::Scalar(ScalarType::Bool)).help_flag()
    }

    /// Override the computed default arity.
    pub fn arity(mut self, arity: ArityRange) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Require this parameter to be matched at least once per parse.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Display label for the value (`"FILE"`).  Defaults to the field name in angle brackets.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Omit from help output.  Hidden parameters still parse.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Mark as a help flag.  Forces a boolean flag shape (arity `0`).
    pub fn help_flag(mut self) -> Self {
        self.help_flag = true;
        self.shape = ValueShape::Scalar(ScalarType::Bool);
        self.arity = Some(ArityRange::exactly(0));
        self
    }

    /// Document the help row for this parameter.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn shape(&self) -> &ValueShape {
        &self.shape
    }

    pub fn element_type(&self) -> &ScalarType {
        self.shape.element()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_help_flag(&self) -> bool {
        self.help_flag
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The declared arity, or the default computed from the value shape:
    /// boolean scalars consume `0` tokens, other scalars `1`, sequences `0..*`.
    pub fn effective_arity(&self) -> ArityRange {
        if let Some(arity) = self.arity {
            return arity;
        }

        match &self.shape {
            ValueShape::Scalar(ScalarType::Bool) => ArityRange::exactly(0),
            ValueShape::Scalar(_) => ArityRange::exactly(1),
            ValueShape::Sequence(_) => ArityRange::at_least(0),
        }
    }

    pub(crate) fn is_boolean(&self) -> bool {
        matches!(self.shape.element(), ScalarType::Bool)
    }

    /// The first declared name, used in user-facing diagnostics.
    pub(crate) fn primary_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.field)
    }

    /// Diagnostic site: `option '-c'` for named options, `parameter[i]` for positionals.
    pub(crate) fn descriptor(&self, positional_index: usize) -> String {
        match self.kind {
            ParameterKind::NamedOption => format!("option '{}'", self.primary_name()),
            ParameterKind::Positional => format!("parameter[{positional_index}]"),
        }
    }

    /// The value label: the declared one, or the field name wrapped in angle brackets.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("<{}>", self.field),
        }
    }
}
