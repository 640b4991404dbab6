use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use encoding_rs::Encoding;
use regex::Regex;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// The conversion target of a single value token.
///
/// Built-in entries convert through the ecosystem's parsers; `Custom` keys dispatch to
/// converters registered on the [`ConverterRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    /// The arbitrarily-wide integral rendition.
    I128,
    F32,
    F64,
    Str,
    Path,
    Url,
    /// Calendar date, `yyyy-MM-dd` only.
    Date,
    /// Wall-clock time: `HH:mm`, `HH:mm:ss`, `HH:mm:ss.SSS` or `HH:mm:ss,SSS`.
    Time,
    Charset,
    IpAddr,
    Regex,
    Uuid,
    /// Matched exact-case against the defined variant names.
    Enum(Vec<String>),
    /// An extension key resolved through explicit registration.
    Custom(String),
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScalarType::Bool => "bool",
            ScalarType::Char => "char",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::I128 => "i128",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
            ScalarType::Str => "String",
            ScalarType::Path => "PathBuf",
            ScalarType::Url => "Url",
            ScalarType::Date => "Date",
            ScalarType::Time => "Time",
            ScalarType::Charset => "Charset",
            ScalarType::IpAddr => "IpAddr",
            ScalarType::Regex => "Regex",
            ScalarType::Uuid => "Uuid",
            ScalarType::Enum(_) => "enum",
            ScalarType::Custom(key) => key.as_str(),
        };
        write!(f, "{name}")
    }
}

/// A converted value, ready to be written through a [`Sink`](crate::Sink).
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Char(char),
    Int(i64),
    BigInt(i128),
    Float(f64),
    Str(String),
    Path(PathBuf),
    Url(Url),
    Date(NaiveDate),
    Time(NaiveTime),
    Charset(&'static Encoding),
    Ip(IpAddr),
    Regex(Regex),
    Uuid(Uuid),
    /// The canonical variant name selected by an enum conversion.
    Enum(String),
    /// Output of a registered custom converter that keeps the token's text form.
    Custom { type_name: String, text: String },
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Path(a), Value::Path(b)) => a == b,
            (Value::Url(a), Value::Url(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Charset(a), Value::Charset(b)) => a == b,
            (Value::Ip(a), Value::Ip(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (
                Value::Custom {
                    type_name: at,
                    text: ax,
                },
                Value::Custom {
                    type_name: bt,
                    text: bx,
                },
            ) => at == bt && ax == bx,
            _ => false,
        }
    }
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(inner) => Some(*inner),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(inner) => Some(*inner),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(inner) => Some(*inner),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(inner) => Some(inner.as_str()),
            Value::Enum(inner) => Some(inner.as_str()),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            Value::Path(inner) => Some(inner.as_path()),
            _ => None,
        }
    }
}

/// A rejected conversion.  The message names the token and the target type, but not the
/// parse site; the parser appends `for option '..'`/`for parameter[..]` when it raises
/// [`ParameterError::TypeConversion`](crate::ParameterError::TypeConversion).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConvertError {
    message: String,
}

impl ConvertError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn rejected(token: &str, target: &ScalarType) -> Self {
        Self::new(format!("Could not convert '{token}' to {target}"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

type Converter = Box<dyn Fn(&str) -> Result<Value, ConvertError> + Send + Sync>;

/// The mapping from scalar type to conversion function.
///
/// The built-in table is fixed; [`ConverterRegistry::register`] extends it for
/// [`ScalarType::Custom`] keys.  Looking up an unregistered custom key is the
/// [`MissingTypeConverter`](crate::ParameterError::MissingTypeConverter) condition, raised
/// by the parser the first time the referencing spec is matched.
#[derive(Default)]
pub struct ConverterRegistry {
    custom: HashMap<String, Converter>,
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("custom", &self.custom.keys())
            .finish()
    }
}

impl ConverterRegistry {
    /// Install a converter for a [`ScalarType::Custom`] key.
    /// Re-registering a key replaces the previous converter.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        converter: impl Fn(&str) -> Result<Value, ConvertError> + Send + Sync + 'static,
    ) {
        self.custom.insert(type_name.into(), Box::new(converter));
    }

    /// Whether a conversion exists for the given type.
    pub fn supports(&self, target: &ScalarType) -> bool {
        match target {
            ScalarType::Custom(key) => self.custom.contains_key(key),
            _ => true,
        }
    }

    /// Convert one raw token into the target type.
    pub fn convert(
        &self,
        target: &ScalarType,
        raw: &str,
        case_insensitive_enums: bool,
    ) -> Result<Value, ConvertError> {
        match target {
            ScalarType::Bool => parse_boolean(raw)
                .map(Value::Bool)
                .ok_or_else(|| ConvertError::rejected(raw, target)),
            ScalarType::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(single), None) => Ok(Value::Char(single)),
                    _ => Err(ConvertError::rejected(raw, target)),
                }
            }
            ScalarType::I8 => integral(raw, target, i8::MIN as i128, i8::MAX as i128),
            ScalarType::I16 => integral(raw, target, i16::MIN as i128, i16::MAX as i128),
            ScalarType::I32 => integral(raw, target, i32::MIN as i128, i32::MAX as i128),
            ScalarType::I64 => integral(raw, target, i64::MIN as i128, i64::MAX as i128),
            ScalarType::I128 => parse_integral(raw)
                .map(Value::BigInt)
                .ok_or_else(|| ConvertError::rejected(raw, target)),
            ScalarType::F32 => f32::from_str(raw)
                .map(|parsed| Value::Float(parsed as f64))
                .map_err(|_| ConvertError::rejected(raw, target)),
            ScalarType::F64 => f64::from_str(raw)
                .map(Value::Float)
                .map_err(|_| ConvertError::rejected(raw, target)),
            ScalarType::Str => Ok(Value::Str(raw.to_string())),
            ScalarType::Path => Ok(Value::Path(PathBuf::from(raw))),
            ScalarType::Url => Url::parse(raw)
                .map(Value::Url)
                .map_err(|_| ConvertError::rejected(raw, target)),
            ScalarType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| ConvertError::new(format!("'{raw}' is not a yyyy-MM-dd date"))),
            ScalarType::Time => parse_time(raw)
                .map(Value::Time)
                .ok_or_else(|| {
                    ConvertError::new(format!("'{raw}' is not a HH:mm[:ss[.SSS]] time"))
                }),
            ScalarType::Charset => Encoding::for_label(raw.as_bytes())
                .map(Value::Charset)
                .ok_or_else(|| ConvertError::rejected(raw, target)),
            ScalarType::IpAddr => IpAddr::from_str(raw)
                .map(Value::Ip)
                .map_err(|_| ConvertError::rejected(raw, target)),
            ScalarType::Regex => Regex::new(raw)
                .map(Value::Regex)
                .map_err(|_| ConvertError::rejected(raw, target)),
            ScalarType::Uuid => Uuid::parse_str(raw)
                .map(Value::Uuid)
                .map_err(|_| ConvertError::rejected(raw, target)),
            ScalarType::Enum(variants) => {
                let found = variants.iter().find(|variant| {
                    if case_insensitive_enums {
                        variant.eq_ignore_ascii_case(raw)
                    } else {
                        variant.as_str() == raw
                    }
                });
                match found {
                    Some(variant) => Ok(Value::Enum(variant.clone())),
                    None => Err(ConvertError::new(format!(
                        "Could not convert '{raw}' to enum value (expected one of: {})",
                        variants.join(", ")
                    ))),
                }
            }
            ScalarType::Custom(key) => match self.custom.get(key) {
                Some(converter) => converter(raw),
                None => Err(ConvertError::new(format!(
                    "no converter registered for type '{key}'"
                ))),
            },
        }
    }
}

/// Case-insensitive `true`/`false`; anything else is not a boolean.
pub(crate) fn parse_boolean(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn integral(raw: &str, target: &ScalarType, min: i128, max: i128) -> Result<Value, ConvertError> {
    match parse_integral(raw) {
        Some(parsed) if parsed >= min && parsed <= max => Ok(Value::Int(parsed as i64)),
        _ => Err(ConvertError::rejected(raw, target)),
    }
}

/// Decimal, hexadecimal (`0x`), and octal (leading `0`) integral literals.
fn parse_integral(raw: &str) -> Option<i128> {
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, hex)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    if digits.is_empty() {
        return None;
    }

    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    if negative {
        magnitude.checked_neg()
    } else {
        Some(magnitude)
    }
}

/// `HH:mm`, `HH:mm:ss`, `HH:mm:ss.SSS`, `HH:mm:ss,SSS` — tried in that priority order.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return Some(time);
    }

    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M:%S") {
        return Some(time);
    }

    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M:%S%.3f") {
        return Some(time);
    }

    // The comma-millisecond shape normalizes onto the dot shape.
    if raw.len() == 12 && raw.as_bytes().get(8) == Some(&b',') {
        let dotted = raw.replacen(',', ".", 1);
        return NaiveTime::parse_from_str(&dotted, "%H:%M:%S%.3f").ok();
    }

    None
}
