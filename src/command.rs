use std::collections::{HashMap, HashSet};

use crate::constant::{DEFAULT_PROGRAM_NAME, DEFAULT_SEPARATOR};
use crate::convert::{ConvertError, ConverterRegistry, Value};
use crate::error::ParameterError;
use crate::model::{ParameterKind, ParameterSpec};

/// The immutable description of one program: its parameter specs indexed for lookup, plus the
/// program-level settings the parser and help renderer share.
///
/// Built once via [`CommandModel::builder`]; safe to share across threads for concurrent
/// parses (each with its own [`Sink`](crate::Sink)) and concurrent help rendering.
#[derive(Debug)]
pub struct CommandModel {
    specs: Vec<ParameterSpec>,
    names: HashMap<String, usize>,
    positional: Option<usize>,
    prefixes: HashSet<char>,
    program: String,
    separator: String,
    summary: Vec<String>,
    footer: Vec<String>,
    detailed_usage: bool,
    case_insensitive_enums: bool,
    reject_unknown: bool,
    converters: ConverterRegistry,
}

impl CommandModel {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// All specs, in declaration order.
    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    /// Look an option up by one of its literal names.
    pub fn lookup(&self, name: &str) -> Option<&ParameterSpec> {
        self.names.get(name).map(|index| &self.specs[*index])
    }

    pub(crate) fn lookup_index(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// The positional spec, when the command declares one.
    pub fn positional(&self) -> Option<&ParameterSpec> {
        self.positional.map(|index| &self.specs[index])
    }

    pub(crate) fn positional_index(&self) -> Option<usize> {
        self.positional
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub(crate) fn set_separator(&mut self, separator: String) {
        self.separator = separator;
    }

    pub fn summary_lines(&self) -> &[String] {
        &self.summary
    }

    pub fn footer_lines(&self) -> &[String] {
        &self.footer
    }

    pub fn detailed_usage(&self) -> bool {
        self.detailed_usage
    }

    pub fn case_insensitive_enums(&self) -> bool {
        self.case_insensitive_enums
    }

    pub(crate) fn rejects_unknown(&self) -> bool {
        self.reject_unknown
    }

    /// Whether a stray token is shaped like an option of this command.
    pub(crate) fn resembles_option(&self, token: &str) -> bool {
        token.chars().count() > 1
            && token
                .chars()
                .next()
                .map(|first| self.prefixes.contains(&first))
                .unwrap_or(false)
    }

    pub(crate) fn convert(
        &self,
        spec: &ParameterSpec,
        raw: &str,
    ) -> Result<Value, ConvertError> {
        self.converters
            .convert(spec.element_type(), raw, self.case_insensitive_enums)
    }

    pub(crate) fn supports(&self, spec: &ParameterSpec) -> bool {
        self.converters.supports(spec.element_type())
    }
}

/// Accumulates parameter specs and program settings, then validates into a [`CommandModel`].
#[derive(Debug)]
pub struct ModelBuilder {
    specs: Vec<ParameterSpec>,
    program: String,
    separator: String,
    summary: Vec<String>,
    footer: Vec<String>,
    detailed_usage: bool,
    case_insensitive_enums: bool,
    reject_unknown: bool,
    converters: ConverterRegistry,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self {
            specs: Vec::default(),
            program: DEFAULT_PROGRAM_NAME.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            summary: Vec::default(),
            footer: Vec::default(),
            detailed_usage: false,
            case_insensitive_enums: false,
            reject_unknown: false,
            converters: ConverterRegistry::default(),
        }
    }
}

impl ModelBuilder {
    /// Name the program as it appears in the usage line.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The string joining an option name to its inline value.  Must be non-empty.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// A line emitted verbatim before the usage line.  Repeat to add more.
    pub fn summary_line(mut self, line: impl Into<String>) -> Self {
        self.summary.push(line.into());
        self
    }

    /// A line emitted verbatim after the option rows.  Repeat to add more.
    pub fn footer_line(mut self, line: impl Into<String>) -> Self {
        self.footer.push(line.into());
        self
    }

    /// Enumerate every option in the usage line instead of the `[OPTIONS]` shorthand.
    pub fn detailed_usage(mut self, detailed: bool) -> Self {
        self.detailed_usage = detailed;
        self
    }

    /// Relax enum conversion to ignore ASCII case.
    pub fn case_insensitive_enums(mut self, relaxed: bool) -> Self {
        self.case_insensitive_enums = relaxed;
        self
    }

    /// Fail the parse when an option-shaped token matches no spec, instead of letting it
    /// join the positional stream.
    pub fn reject_unknown_options(mut self, reject: bool) -> Self {
        self.reject_unknown = reject;
        self
    }

    /// Register a converter for a [`ScalarType::Custom`](crate::ScalarType::Custom) key.
    pub fn converter(
        mut self,
        type_name: impl Into<String>,
        converter: impl Fn(&str) -> Result<Value, ConvertError> + Send + Sync + 'static,
    ) -> Self {
        self.converters.register(type_name, converter);
        self
    }

    /// Add a parameter spec.  Declaration order is preserved.
    pub fn add(mut self, spec: ParameterSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Validate and index the model.
    pub fn build(self) -> Result<CommandModel, ParameterError> {
        let ModelBuilder {
            mut specs,
            program,
            separator,
            summary,
            footer,
            detailed_usage,
            case_insensitive_enums,
            reject_unknown,
            converters,
        } = self;

        if separator.is_empty() {
            return Err(ParameterError::illegal("the separator must be non-empty"));
        }

        let mut names: HashMap<String, usize> = HashMap::default();
        let mut positional: Option<usize> = None;
        let mut prefixes: HashSet<char> = HashSet::default();

        for (index, spec) in specs.iter_mut().enumerate() {
            spec.order = index;

            match spec.kind() {
                ParameterKind::NamedOption => {
                    if spec.names().is_empty() {
                        return Err(ParameterError::illegal(format!(
                            "option '{}' must declare at least one name",
                            spec.field()
                        )));
                    }

                    for name in spec.names() {
                        if names.insert(name.clone(), index).is_some() {
                            return Err(ParameterError::DuplicateParameterName {
                                name: name.clone(),
                            });
                        }

                        if let Some(first) = name.chars().next() {
                            prefixes.insert(first);
                        }
                    }
                }
                ParameterKind::Positional => {
                    if positional.replace(index).is_some() {
                        return Err(ParameterError::illegal(
                            "at most one positional parameter is supported",
                        ));
                    }
                }
            }
        }

        Ok(CommandModel {
            specs,
            names,
            positional,
            prefixes,
            program,
            separator,
            summary,
            footer,
            detailed_usage,
            case_insensitive_enums,
            reject_unknown,
            converters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ScalarType;
    use crate::model::ValueShape;

    fn flag(name: &str, field: &str) -> ParameterSpec {
        ParameterSpec::option([name], field, ValueShape::Scalar(ScalarType::Bool))
    }

    #[test]
    fn builds_and_indexes() {
        let model = CommandModel::builder()
            .program("tool")
            .add(ParameterSpec::option(
                ["-c", "--count"],
                "count",
                ValueShape::Scalar(ScalarType::I32),
            ))
            .add(ParameterSpec::positional(
                "files",
                ValueShape::Sequence(ScalarType::Path),
            ))
            .build()
            .unwrap();

        assert_eq!(model.program(), "tool");
        assert_eq!(model.separator(), "=");
        assert_eq!(model.lookup("-c").unwrap().field(), "count");
        assert_eq!(model.lookup("--count").unwrap().field(), "count");
        assert!(model.lookup("-x").is_none());
        assert_eq!(model.positional().unwrap().field(), "files");
    }

    #[test]
    fn default_program_name() {
        let model = CommandModel::builder().build().unwrap();
        assert_eq!(model.program(), "<main class>");
    }

    #[test]
    fn duplicate_name_across_specs() {
        let result = CommandModel::builder()
            .add(flag("-v", "verbose"))
            .add(flag("-v", "version"))
            .build();

        assert_eq!(
            result.unwrap_err(),
            ParameterError::DuplicateParameterName {
                name: "-v".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_name_within_one_spec() {
        let result = CommandModel::builder()
            .add(ParameterSpec::option(
                ["-v", "-v"],
                "verbose",
                ValueShape::Scalar(ScalarType::Bool),
            ))
            .build();

        assert_matches!(result, Err(ParameterError::DuplicateParameterName { .. }));
    }

    #[test]
    fn second_positional_rejected() {
        let result = CommandModel::builder()
            .add(ParameterSpec::positional("a", ValueShape::Scalar(ScalarType::Str)))
            .add(ParameterSpec::positional("b", ValueShape::Scalar(ScalarType::Str)))
            .build();

        assert_matches!(result, Err(ParameterError::IllegalArgumentUsage { .. }));
    }

    #[test]
    fn empty_separator_rejected() {
        let result = CommandModel::builder().separator("").build();
        assert_matches!(result, Err(ParameterError::IllegalArgumentUsage { .. }));
    }

    #[test]
    fn nameless_option_rejected() {
        let result = CommandModel::builder()
            .add(ParameterSpec::option(
                Vec::<String>::default(),
                "verbose",
                ValueShape::Scalar(ScalarType::Bool),
            ))
            .build();

        assert_matches!(result, Err(ParameterError::IllegalArgumentUsage { .. }));
    }

    #[test]
    fn option_shape_detection() {
        let model = CommandModel::builder()
            .add(flag("-v", "verbose"))
            .add(flag("/f", "force"))
            .build()
            .unwrap();

        assert!(model.resembles_option("-x"));
        assert!(model.resembles_option("/quiet"));
        assert!(!model.resembles_option("value"));
        assert!(!model.resembles_option("-"));
    }
}
