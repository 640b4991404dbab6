use crate::command::CommandModel;
use crate::convert::{parse_boolean, Value};
use crate::error::ParameterError;
use crate::model::ParameterSpec;
use crate::sink::Sink;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

// The exact two-character end-of-options token.
const TERMINATOR: &str = "--";

/// How one token resolved against the model's named options.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MatchPlan {
    /// Boolean flags consumed out of a short-option cluster, left to right.
    flags: Vec<usize>,
    /// The spec that may go on to consume value tokens, when the token ends in one.
    target: Option<usize>,
    /// A value attached inside the token itself (separator or short-form).
    inline: Option<String>,
}

/// Match `token` against the model per the name-matching rules: exact string first, then
/// name-plus-separator, then short-name attachment/clustering.  `None` means the token is
/// not an option of this command.
pub(crate) fn classify(model: &CommandModel, token: &str) -> Option<MatchPlan> {
    if let Some(index) = model.lookup_index(token) {
        return Some(MatchPlan {
            flags: Vec::default(),
            target: Some(index),
            inline: None,
        });
    }

    let separator = model.separator();

    for spec in model.specs() {
        for name in spec.names() {
            if let Some(rest) = token.strip_prefix(name.as_str()) {
                if let Some(value) = rest.strip_prefix(separator) {
                    return Some(MatchPlan {
                        flags: Vec::default(),
                        target: Some(spec.order),
                        inline: Some(value.to_string()),
                    });
                }
            }
        }
    }

    cluster(model, token)
}

/// Walk a compacted short-option token (`-rvoout`).  Every character must name a registered
/// short option; arity-0 booleans stack up as flags, and the first value-taking option ends
/// the cluster by swallowing the remainder (separator included) as its inline value.
fn cluster(model: &CommandModel, token: &str) -> Option<MatchPlan> {
    let chars: Vec<char> = token.chars().collect();

    // Two-character tokens were already tried as exact names.
    if chars.len() <= 2 {
        return None;
    }

    let prefix = chars[0];
    let mut flags = Vec::default();
    let mut position = 1;

    while position < chars.len() {
        let name: String = [prefix, chars[position]].iter().collect();
        let index = model.lookup_index(&name)?;
        let spec = &model.specs()[index];

        if spec.effective_arity().max() != Some(0) {
            let rest: String = chars[position + 1..].iter().collect();
            let inline = if rest.is_empty() { None } else { Some(rest) };
            return Some(MatchPlan {
                flags,
                target: Some(index),
                inline,
            });
        }

        if !spec.is_boolean() {
            return None;
        }

        flags.push(index);
        position += 1;
    }

    Some(MatchPlan {
        flags,
        target: None,
        inline: None,
    })
}

/// Strip one layer of surrounding double quotes.
fn unquote(token: &str) -> String {
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        token[1..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

/// Walk the token sequence against the model, writing converted values through the sink.
pub(crate) fn run(
    model: &CommandModel,
    sink: &mut dyn Sink,
    tokens: &[&str],
) -> Result<(), ParameterError> {
    let mut walk = Walk {
        model,
        matched: vec![false; model.specs().len()],
        help_latched: false,
    };
    let mut positionals: Vec<String> = Vec::default();
    let mut after_terminator = false;
    let mut positional_mode = false;
    let mut cursor = 0;

    while cursor < tokens.len() {
        let token = tokens[cursor];

        if !after_terminator && token == TERMINATOR {
            after_terminator = true;
            cursor += 1;
            continue;
        }

        if after_terminator || positional_mode {
            positionals.push(token.to_string());
            cursor += 1;
            continue;
        }

        match classify(model, token) {
            Some(plan) => {
                #[cfg(feature = "tracing_debug")]
                debug!("Token '{token}' matched: {plan:?}");

                cursor += 1;
                walk.apply(sink, tokens, &mut cursor, plan)?;
            }
            None => {
                if model.rejects_unknown() && model.resembles_option(token) {
                    return Err(ParameterError::UnknownOption {
                        token: token.to_string(),
                    });
                }

                #[cfg(feature = "tracing_debug")]
                debug!("Token '{token}' starts the positional stream.");

                positional_mode = true;
                positionals.push(token.to_string());
                cursor += 1;
            }
        }
    }

    walk.feed_positionals(sink, &positionals)?;

    if !walk.help_latched {
        walk.check_positional_minimum(positionals.len())?;
        walk.check_required()?;
    }

    Ok(())
}

struct Walk<'m> {
    model: &'m CommandModel,
    matched: Vec<bool>,
    help_latched: bool,
}

impl<'m> Walk<'m> {
    fn apply(
        &mut self,
        sink: &mut dyn Sink,
        tokens: &[&str],
        cursor: &mut usize,
        plan: MatchPlan,
    ) -> Result<(), ParameterError> {
        let MatchPlan {
            flags,
            target,
            inline,
        } = plan;

        for index in flags {
            let spec = &self.model.specs()[index];
            self.mark(index);
            store(sink, spec, Value::Bool(true));
        }

        if let Some(index) = target {
            self.consume(sink, tokens, cursor, index, inline)?;
        }

        Ok(())
    }

    /// Draw values for a matched option: the inline value first, then following tokens up to
    /// the arity window.  The first `min` values are taken unconditionally; the variable
    /// portion stops early at anything shaped like an option or the terminator.
    fn consume(
        &mut self,
        sink: &mut dyn Sink,
        tokens: &[&str],
        cursor: &mut usize,
        index: usize,
        inline: Option<String>,
    ) -> Result<(), ParameterError> {
        let spec = &self.model.specs()[index];
        self.ensure_converter(spec)?;
        self.mark(index);

        let arity = spec.effective_arity();
        let min = arity.min();

        // A pure flag records its presence; an inline value must spell a boolean and may
        // flip it back off (`-v=false`).
        if arity.max() == Some(0) {
            let value = match inline {
                Some(raw) => self.convert(spec, &unquote(&raw), None)?,
                None => Value::Bool(true),
            };
            store(sink, spec, value);
            return Ok(());
        }

        let mut count = 0;

        if let Some(raw) = inline {
            let value = self.convert(spec, &unquote(&raw), None)?;
            store(sink, spec, value);
            count += 1;
        }

        // Boolean options sit the fence: past their minimum they take at most one value,
        // and only when it spells a boolean.
        let cap = if spec.is_boolean() {
            Some(std::cmp::max(min, 1))
        } else {
            arity.max()
        };

        while cap.map(|limit| count < limit).unwrap_or(true) {
            let Some(next) = tokens.get(*cursor) else {
                break;
            };

            if count >= min {
                if *next == TERMINATOR || classify(self.model, next).is_some() {
                    break;
                }

                if spec.is_boolean() && parse_boolean(&unquote(next)).is_none() {
                    break;
                }
            }

            let value = self.convert(spec, &unquote(next), None)?;
            store(sink, spec, value);
            *cursor += 1;
            count += 1;
        }

        if count < min {
            return Err(ParameterError::MissingParameter {
                descriptor: spec.descriptor(0),
                expected: min,
                received: count,
            });
        }

        // A matched boolean that drew no value still records its presence.
        if count == 0 && spec.is_boolean() {
            store(sink, spec, Value::Bool(true));
        }

        Ok(())
    }

    /// Convert and store the accumulated positional tokens, up to the positional arity.
    /// Without a positional spec the extras are discarded silently.
    fn feed_positionals(
        &mut self,
        sink: &mut dyn Sink,
        raw_values: &[String],
    ) -> Result<(), ParameterError> {
        let Some(index) = self.model.positional_index() else {
            return Ok(());
        };
        let spec = &self.model.specs()[index];

        if !raw_values.is_empty() {
            self.ensure_converter(spec)?;
            self.mark(index);
        }

        let limit = spec.effective_arity().max().unwrap_or(usize::MAX);

        for (position, raw) in raw_values.iter().take(limit).enumerate() {
            let value = self.convert(spec, &unquote(raw), Some(position))?;
            store(sink, spec, value);
        }

        Ok(())
    }

    fn check_positional_minimum(&self, received: usize) -> Result<(), ParameterError> {
        let Some(spec) = self.model.positional() else {
            return Ok(());
        };
        let min = spec.effective_arity().min();

        if received < min {
            return Err(ParameterError::MissingParameter {
                descriptor: spec.descriptor(received),
                expected: min,
                received,
            });
        }

        Ok(())
    }

    fn check_required(&self) -> Result<(), ParameterError> {
        let missing: Vec<String> = self
            .model
            .specs()
            .iter()
            .zip(self.matched.iter())
            .filter(|(spec, matched)| spec.is_required() && !**matched)
            .map(|(spec, _)| match spec.names().first() {
                Some(name) => name.clone(),
                None => spec.display_label(),
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ParameterError::MissingRequiredOption { names: missing })
        }
    }

    fn mark(&mut self, index: usize) {
        self.matched[index] = true;

        if self.model.specs()[index].is_help_flag() {
            self.help_latched = true;
        }
    }

    fn ensure_converter(&self, spec: &ParameterSpec) -> Result<(), ParameterError> {
        if self.model.supports(spec) {
            Ok(())
        } else {
            Err(ParameterError::MissingTypeConverter {
                type_name: spec.element_type().to_string(),
                descriptor: spec.descriptor(0),
            })
        }
    }

    fn convert(
        &self,
        spec: &ParameterSpec,
        raw: &str,
        positional_index: Option<usize>,
    ) -> Result<Value, ParameterError> {
        self.model.convert(spec, raw).map_err(|error| {
            ParameterError::TypeConversion {
                message: format!(
                    "{} for {}",
                    error.message(),
                    spec.descriptor(positional_index.unwrap_or(0))
                ),
            }
        })
    }
}

fn store(sink: &mut dyn Sink, spec: &ParameterSpec, value: Value) {
    if spec.shape().is_sequence() {
        sink.append(spec.field(), value);
    } else {
        sink.write(spec.field(), value);
    }
}
