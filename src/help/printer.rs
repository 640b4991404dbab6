use std::collections::BTreeMap;
use std::fmt;

use terminal_size::{terminal_size, Width};

use crate::command::CommandModel;
use crate::constant::{LINE_SEPARATOR, USAGE_WIDTH};
use crate::error::ParameterError;
use crate::help::table::{Column, Overflow, TextTable};
use crate::model::{ParameterKind, ParameterSpec};

/// Ordering of the option rows in the help screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionSort {
    /// Keep declaration order.
    Declaration,
    /// Sort by each option's shortest name.
    #[default]
    ShortestName,
    /// Sort by arity maximum, then arity minimum, then shortest name.
    ArityAndName,
}

// 17 fits three average words with their separating spaces.
const MINIMUM_DESCRIPTION_WIDTH: usize = 17;

// The fixed width in front of the description column of the default option table.
const DESCRIPTION_OFFSET: usize = 29;

/// Render the help screen for `model` with the default sort and renderer.
pub fn usage(model: &CommandModel, out: &mut dyn fmt::Write) -> Result<(), ParameterError> {
    Help::new(model).render(out)
}

/// A configurable help rendering.
///
/// Help output is a pure function of the [`CommandModel`]: summary lines, the synthesized
/// usage line, one row per non-hidden parameter, then the footer.
///
/// ### Example
/// ```
/// use argot::{CommandModel, Help, ParameterSpec, ScalarType, ValueShape};
///
/// let model = CommandModel::builder()
///     .program("greet")
///     .add(ParameterSpec::option(["-n", "--name"], "name", ValueShape::Scalar(ScalarType::Str))
///         .describe("Who to greet."))
///     .build()
///     .unwrap();
///
/// let mut rendered = String::new();
/// Help::new(&model).render(&mut rendered).unwrap();
/// assert!(rendered.starts_with("Usage: greet [OPTIONS]"));
/// ```
pub struct Help<'m> {
    model: &'m CommandModel,
    sort: OptionSort,
    minimal: bool,
    total_width: Option<usize>,
}

impl<'m> Help<'m> {
    pub fn new(model: &'m CommandModel) -> Self {
        Self {
            model,
            sort: OptionSort::default(),
            minimal: false,
            total_width: None,
        }
    }

    /// Choose the option row ordering.
    pub fn sort(mut self, sort: OptionSort) -> Self {
        self.sort = sort;
        self
    }

    /// Render one compact `name  description` row per option instead of the default layout.
    pub fn minimal(mut self) -> Self {
        self.minimal = true;
        self
    }

    /// Size the description column to the current terminal instead of the fixed 80 columns.
    pub fn terminal(mut self) -> Self {
        if let Some((Width(width), _)) = terminal_size() {
            self.total_width = Some(width as usize);
        }

        self
    }

    pub fn render(&self, out: &mut dyn fmt::Write) -> Result<(), ParameterError> {
        for line in self.model.summary_lines() {
            out.write_str(line)?;
            out.write_str(LINE_SEPARATOR)?;
        }

        out.write_str(&self.synopsis())?;
        out.write_str(LINE_SEPARATOR)?;

        let table = self.parameter_rows()?;
        for line in table.lines() {
            out.write_str(&line)?;
            out.write_str(LINE_SEPARATOR)?;
        }

        for line in self.model.footer_lines() {
            out.write_str(line)?;
            out.write_str(LINE_SEPARATOR)?;
        }

        Ok(())
    }

    fn synopsis(&self) -> String {
        if self.model.detailed_usage() {
            self.detailed_synopsis()
        } else {
            self.compact_synopsis()
        }
    }

    fn compact_synopsis(&self) -> String {
        let mut line = format!("Usage: {} [OPTIONS]", self.model.program());

        if let Some(spec) = self.visible_positional() {
            line.push(' ');
            line.push_str(&positional_shape(spec));
        }

        line
    }

    /// Enumerate every visible option: clustered boolean flags first (required before
    /// optional), then long-only flags, then value-taking options sorted by shortest name,
    /// then the positional shape.
    fn detailed_synopsis(&self) -> String {
        let mut required_clusters: BTreeMap<char, Vec<char>> = BTreeMap::default();
        let mut optional_clusters: BTreeMap<char, Vec<char>> = BTreeMap::default();
        let mut long_flags: Vec<&ParameterSpec> = Vec::default();
        let mut value_options: Vec<&ParameterSpec> = Vec::default();

        for spec in self.visible_options() {
            if spec.is_boolean() && spec.effective_arity().max() == Some(0) {
                match shortest_short_name(spec) {
                    Some(short) => {
                        let mut chars = short.chars();
                        let prefix = chars
                            .next()
                            .expect("internal error - short names have two characters");
                        let letter = chars
                            .next()
                            .expect("internal error - short names have two characters");
                        let clusters = if spec.is_required() {
                            &mut required_clusters
                        } else {
                            &mut optional_clusters
                        };
                        clusters.entry(prefix).or_default().push(letter);
                    }
                    None => long_flags.push(spec),
                }
            } else {
                value_options.push(spec);
            }
        }

        let mut parts: Vec<String> = Vec::default();

        for (prefix, mut letters) in required_clusters {
            letters.sort_unstable();
            parts.push(format!("{prefix}{}", letters.iter().collect::<String>()));
        }

        for (prefix, mut letters) in optional_clusters {
            letters.sort_unstable();
            parts.push(format!("[{prefix}{}]", letters.iter().collect::<String>()));
        }

        for spec in long_flags {
            let name = shortest_name(spec);
            if spec.is_required() {
                parts.push(name.to_string());
            } else {
                parts.push(format!("[{name}]"));
            }
        }

        value_options.sort_by(|left, right| shortest_name(left).cmp(shortest_name(right)));
        for spec in value_options {
            parts.push(self.option_template(spec));
        }

        if let Some(spec) = self.visible_positional() {
            parts.push(positional_shape(spec));
        }

        if parts.is_empty() {
            format!("Usage: {}", self.model.program())
        } else {
            format!("Usage: {} {}", self.model.program(), parts.join(" "))
        }
    }

    /// The per-arity value template of one option, bracketed unless required.
    fn option_template(&self, spec: &ParameterSpec) -> String {
        let name = shortest_name(spec);
        let label = spec.display_label();
        let separator = self.model.separator();
        let arity = spec.effective_arity();

        let core = match (arity.min(), arity.max()) {
            (0, Some(1)) => format!("{name}[{separator}{label}]"),
            (0, _) => format!("{name}[{separator}{label}...]"),
            (min, max) => {
                let mut rendered = format!("{name}{separator}{label}");

                for _ in 1..min {
                    rendered.push(' ');
                    rendered.push_str(&label);
                }

                if max != Some(min) {
                    rendered.push_str(&format!(" [{label}...]"));
                }

                rendered
            }
        };

        if spec.is_required() {
            core
        } else {
            format!("[{core}]")
        }
    }

    fn parameter_rows(&self) -> Result<TextTable, ParameterError> {
        let total = self.total_width.unwrap_or(USAGE_WIDTH);
        let mut table = if self.minimal {
            TextTable::new(minimal_columns(total))
        } else {
            TextTable::new(option_columns(total))
        };

        if let Some(spec) = self.visible_positional() {
            table.add_row(&self.cells(spec))?;
        }

        let mut options = self.visible_options();
        match self.sort {
            OptionSort::Declaration => {}
            OptionSort::ShortestName => {
                options.sort_by(|left, right| shortest_name(left).cmp(shortest_name(right)));
            }
            OptionSort::ArityAndName => {
                options.sort_by(|left, right| {
                    let left_arity = left.effective_arity();
                    let right_arity = right.effective_arity();
                    left_arity
                        .max()
                        .unwrap_or(usize::MAX)
                        .cmp(&right_arity.max().unwrap_or(usize::MAX))
                        .then(left_arity.min().cmp(&right_arity.min()))
                        .then(shortest_name(left).cmp(shortest_name(right)))
                });
            }
        }

        for spec in options {
            table.add_row(&self.cells(spec))?;
        }

        Ok(table)
    }

    fn cells(&self, spec: &ParameterSpec) -> Vec<String> {
        let description = spec.description().unwrap_or("").to_string();

        if self.minimal {
            return vec![minimal_name_cell(spec), description];
        }

        match spec.kind() {
            ParameterKind::Positional => vec![
                String::default(),
                String::default(),
                spec.display_label(),
                String::default(),
                String::default(),
                String::default(),
                description,
            ],
            ParameterKind::NamedOption => {
                let ordered = sorted_names(spec);
                let shortest_short = ordered
                    .iter()
                    .find(|name| name.chars().count() == 2)
                    .copied();

                let (head, rest): (String, Vec<&str>) = match shortest_short {
                    Some(short) => (
                        short.to_string(),
                        ordered.into_iter().filter(|name| *name != short).collect(),
                    ),
                    None => (String::default(), ordered),
                };

                let mut names = rest.join(", ");

                // A space joins the names cell to its label inside the details table.
                if spec.effective_arity().max() != Some(0) {
                    let label = spec.display_label();
                    if names.is_empty() {
                        names = label;
                    } else {
                        names = format!("{names} {label}");
                    }
                }

                let comma = if !head.is_empty() && !names.is_empty() {
                    ",".to_string()
                } else {
                    String::default()
                };

                vec![
                    head,
                    comma,
                    names,
                    String::default(),
                    String::default(),
                    String::default(),
                    description,
                ]
            }
        }
    }

    fn visible_options(&self) -> Vec<&'m ParameterSpec> {
        self.model
            .specs()
            .iter()
            .filter(|spec| spec.kind() == ParameterKind::NamedOption && !spec.is_hidden())
            .collect()
    }

    fn visible_positional(&self) -> Option<&'m ParameterSpec> {
        self.model.positional().filter(|spec| !spec.is_hidden())
    }
}

/// The names of one spec, shortest first; equal lengths keep declaration order.
fn sorted_names(spec: &ParameterSpec) -> Vec<&str> {
    let mut names: Vec<&str> = spec.names().iter().map(String::as_str).collect();
    names.sort_by_key(|name| name.chars().count());
    names
}

fn shortest_name(spec: &ParameterSpec) -> &str {
    sorted_names(spec)
        .first()
        .copied()
        .unwrap_or_else(|| spec.field())
}

fn shortest_short_name(spec: &ParameterSpec) -> Option<&str> {
    sorted_names(spec)
        .into_iter()
        .find(|name| name.chars().count() == 2)
}

/// The positional's slot in the usage line: `[FILE...]`, `FILE [FILE...]`, etc.
fn positional_shape(spec: &ParameterSpec) -> String {
    let label = spec.display_label();
    let arity = spec.effective_arity();

    match (arity.min(), arity.max()) {
        (0, Some(1)) => format!("[{label}]"),
        (0, _) => format!("[{label}...]"),
        (1, Some(1)) => label,
        _ => format!("{label} [{label}...]"),
    }
}

fn option_columns(total: usize) -> Vec<Column> {
    let mut columns = TextTable::default_option_columns();

    if total != USAGE_WIDTH {
        if let Some(last) = columns.last_mut() {
            last.width = std::cmp::max(
                MINIMUM_DESCRIPTION_WIDTH,
                total.saturating_sub(DESCRIPTION_OFFSET),
            );
        }
    }

    columns
}

fn minimal_columns(total: usize) -> Vec<Column> {
    vec![
        Column::new(28, 2, Overflow::Span),
        Column::new(
            std::cmp::max(MINIMUM_DESCRIPTION_WIDTH, total.saturating_sub(28)),
            1,
            Overflow::Wrap,
        ),
    ]
}

fn minimal_name_cell(spec: &ParameterSpec) -> String {
    match spec.kind() {
        ParameterKind::Positional => spec.display_label(),
        ParameterKind::NamedOption => {
            let first = spec
                .names()
                .first()
                .map(String::as_str)
                .unwrap_or_else(|| spec.field());

            if spec.effective_arity().max() == Some(0) {
                first.to_string()
            } else {
                format!("{first} {}", spec.display_label())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ScalarType;
    use crate::model::{ArityRange, ValueShape};
    use crate::test::assert_contains;
    use rstest::rstest;

    fn flag(name: &str, field: &str) -> ParameterSpec {
        ParameterSpec::option([name], field, ValueShape::Scalar(ScalarType::Bool))
    }

    fn render(model: &CommandModel) -> String {
        let mut rendered = String::default();
        Help::new(model).render(&mut rendered).unwrap();
        rendered
    }

    fn first_line(rendered: &str) -> &str {
        rendered.lines().next().unwrap()
    }

    #[test]
    fn detailed_synopsis_with_required_value_option() {
        let model = CommandModel::builder()
            .detailed_usage(true)
            .add(
                ParameterSpec::option(["-c"], "count", ValueShape::Scalar(ScalarType::I32))
                    .required(),
            )
            .add(flag("-v", "verbose"))
            .add(flag("-h", "help").hidden())
            .build()
            .unwrap();

        assert_eq!(
            first_line(&render(&model)),
            "Usage: <main class> [-v] -c=<count>"
        );
    }

    #[test]
    fn detailed_synopsis_clusters_flags() {
        let model = CommandModel::builder()
            .program("tool")
            .detailed_usage(true)
            .add(flag("-z", "zeta"))
            .add(flag("-a", "alpha"))
            .add(flag("-r", "run").required())
            .add(flag("-b", "batch").required())
            .build()
            .unwrap();

        // Required flags cluster un-bracketed and precede the optional cluster;
        // both sort by code point.
        assert_eq!(first_line(&render(&model)), "Usage: tool -br [-az]");
    }

    #[test]
    fn detailed_synopsis_keeps_long_flags_single() {
        let model = CommandModel::builder()
            .program("tool")
            .detailed_usage(true)
            .add(flag("--verbose", "verbose"))
            .add(flag("-q", "quiet"))
            .build()
            .unwrap();

        assert_eq!(first_line(&render(&model)), "Usage: tool [-q] [--verbose]");
    }

    #[rstest]
    #[case(ArityRange::between(0, 1).unwrap(), false, "[-c[=<count>]]")]
    #[case(ArityRange::at_least(0), false, "[-c[=<count>...]]")]
    #[case(ArityRange::exactly(1), false, "[-c=<count>]")]
    #[case(ArityRange::at_least(1), false, "[-c=<count> [<count>...]]")]
    #[case(ArityRange::between(0, 1).unwrap(), true, "-c[=<count>]")]
    #[case(ArityRange::at_least(0), true, "-c[=<count>...]")]
    #[case(ArityRange::exactly(1), true, "-c=<count>")]
    #[case(ArityRange::at_least(1), true, "-c=<count> [<count>...]")]
    fn arity_templates(
        #[case] arity: ArityRange,
        #[case] required: bool,
        #[case] expected: &str,
    ) {
        let mut spec = ParameterSpec::option(
            ["-c"],
            "count",
            ValueShape::Sequence(ScalarType::I32),
        )
        .arity(arity);

        if required {
            spec = spec.required();
        }

        let model = CommandModel::builder()
            .program("tool")
            .detailed_usage(true)
            .add(spec)
            .build()
            .unwrap();

        assert_eq!(
            first_line(&render(&model)),
            format!("Usage: tool {expected}")
        );
    }

    #[test]
    fn fixed_minimum_repeats_the_label() {
        let model = CommandModel::builder()
            .program("tool")
            .detailed_usage(true)
            .add(
                ParameterSpec::option(["-p"], "pair", ValueShape::Sequence(ScalarType::Str))
                    .arity(ArityRange::exactly(2))
                    .required(),
            )
            .build()
            .unwrap();

        assert_eq!(first_line(&render(&model)), "Usage: tool -p=<pair> <pair>");
    }

    #[rstest]
    #[case(ArityRange::at_least(0), "Usage: tool [OPTIONS] [<files>...]")]
    #[case(ArityRange::at_least(1), "Usage: tool [OPTIONS] <files> [<files>...]")]
    #[case(ArityRange::exactly(1), "Usage: tool [OPTIONS] <files>")]
    #[case(ArityRange::between(0, 1).unwrap(), "Usage: tool [OPTIONS] [<files>]")]
    fn compact_synopsis_positional_shapes(#[case] arity: ArityRange, #[case] expected: &str) {
        let model = CommandModel::builder()
            .program("tool")
            .add(
                ParameterSpec::positional("files", ValueShape::Sequence(ScalarType::Path))
                    .arity(arity),
            )
            .build()
            .unwrap();

        assert_eq!(first_line(&render(&model)), expected);
    }

    #[test]
    fn custom_separator_in_templates() {
        let model = CommandModel::builder()
            .program("tool")
            .separator(":")
            .detailed_usage(true)
            .add(ParameterSpec::option(
                ["-o"],
                "output",
                ValueShape::Scalar(ScalarType::Path),
            ))
            .build()
            .unwrap();

        assert_eq!(first_line(&render(&model)), "Usage: tool [-o:<output>]");
    }

    #[test]
    fn option_rows_sorted_by_shortest_name() {
        let model = CommandModel::builder()
            .add(flag("-z", "zeta").describe("Zeta."))
            .add(flag("-a", "alpha").describe("Alpha."))
            .build()
            .unwrap();

        let rendered = render(&model);
        let alpha = rendered.find("Alpha.").unwrap();
        let zeta = rendered.find("Zeta.").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn option_rows_sorted_by_arity_and_name() {
        let model = CommandModel::builder()
            .add(
                ParameterSpec::option(["-m"], "many", ValueShape::Sequence(ScalarType::Str))
                    .arity(ArityRange::at_least(0))
                    .describe("Many."),
            )
            .add(flag("-z", "zeta").describe("Zeta."))
            .add(
                ParameterSpec::option(["-a"], "one", ValueShape::Scalar(ScalarType::Str))
                    .describe("One."),
            )
            .build()
            .unwrap();

        let mut rendered = String::default();
        Help::new(&model)
            .sort(OptionSort::ArityAndName)
            .render(&mut rendered)
            .unwrap();

        let zeta = rendered.find("Zeta.").unwrap();
        let one = rendered.find("One.").unwrap();
        let many = rendered.find("Many.").unwrap();
        assert!(zeta < one);
        assert!(one < many);
    }

    #[test]
    fn default_row_layout() {
        let model = CommandModel::builder()
            .add(
                ParameterSpec::option(
                    ["-c", "--count"],
                    "count",
                    ValueShape::Scalar(ScalarType::I32),
                )
                .describe("How many times."),
            )
            .build()
            .unwrap();

        let rendered = render(&model);
        assert_contains!(
            rendered,
            format!("{:<80}", "  -c, --count <count>         How many times.").as_str()
        );
    }

    #[test]
    fn long_only_option_row_has_no_comma_cell() {
        let model = CommandModel::builder()
            .add(
                ParameterSpec::option(["--verbose"], "verbose", ValueShape::Scalar(ScalarType::Bool))
                    .describe("Chatty."),
            )
            .build()
            .unwrap();

        let rendered = render(&model);
        assert_contains!(rendered, "      --verbose");
        assert!(!rendered.contains(','));
    }

    #[test]
    fn hidden_options_are_omitted() {
        let model = CommandModel::builder()
            .add(flag("-v", "verbose").describe("Visible."))
            .add(flag("-x", "experimental").hidden().describe("Invisible."))
            .build()
            .unwrap();

        let rendered = render(&model);
        assert_contains!(rendered, "Visible.");
        assert!(!rendered.contains("Invisible."));
        assert!(!rendered.contains("-x"));
    }

    #[test]
    fn positional_row_precedes_options() {
        let model = CommandModel::builder()
            .add(flag("-v", "verbose").describe("Chatty."))
            .add(
                ParameterSpec::positional("files", ValueShape::Sequence(ScalarType::Path))
                    .label("FILE")
                    .describe("Inputs."),
            )
            .build()
            .unwrap();

        let rendered = render(&model);
        let files = rendered.find("FILE").unwrap();
        let verbose = rendered.find("-v").unwrap();
        assert!(files < verbose);
    }

    #[test]
    fn summary_and_footer_are_verbatim() {
        let model = CommandModel::builder()
            .program("tool")
            .summary_line("tool - does the thing")
            .summary_line("")
            .footer_line("See also: tool-extras")
            .add(flag("-v", "verbose"))
            .build()
            .unwrap();

        let rendered = render(&model);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "tool - does the thing");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Usage: tool [OPTIONS]");
        assert_eq!(lines.last().unwrap(), &"See also: tool-extras");
    }

    #[test]
    fn minimal_rows() {
        let model = CommandModel::builder()
            .add(
                ParameterSpec::option(
                    ["--count", "-c"],
                    "count",
                    ValueShape::Scalar(ScalarType::I32),
                )
                .describe("How many times."),
            )
            .build()
            .unwrap();

        let mut rendered = String::default();
        Help::new(&model).minimal().render(&mut rendered).unwrap();

        // The minimal renderer keys rows by the first declared name.
        assert_contains!(rendered, "--count <count>");
        assert_contains!(rendered, "How many times.");
        assert!(!rendered.contains("-c,"));
    }

    #[test]
    fn explicit_labels_win() {
        let model = CommandModel::builder()
            .program("tool")
            .detailed_usage(true)
            .add(
                ParameterSpec::option(["-o"], "output", ValueShape::Scalar(ScalarType::Path))
                    .label("FILE")
                    .required(),
            )
            .build()
            .unwrap();

        assert_eq!(first_line(&render(&model)), "Usage: tool -o=FILE");
    }

    #[test]
    fn rendering_is_pure() {
        let model = CommandModel::builder()
            .add(flag("-v", "verbose").describe("Chatty."))
            .build()
            .unwrap();

        assert_eq!(render(&model), render(&model));
    }
}
