use crate::error::BuilderError;
use chrono::NaiveDate;
use std::fmt;

/// The declared type of a configuration option, parsed from the catalogue's
/// `value_type` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Float,
    Boolean,
    /// ISO-8601 calendar date, `YYYY-MM-DD`.
    Date,
    /// One of a fixed set of values, declared as `enum[a,b,c]`.
    Enum(Vec<String>),
    /// A type this crate does not know. Values are kept as text.
    Other(String),
}

impl ValueType {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(choices) = trimmed
            .strip_prefix("enum[")
            .or_else(|| trimmed.strip_prefix("literal["))
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return ValueType::Enum(
                choices
                    .split(',')
                    .map(|c| c.trim().trim_matches(|q| q == '\'' || q == '"').to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
            );
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "str" | "string" | "text" => ValueType::Text,
            "int" | "integer" => ValueType::Integer,
            "float" | "number" => ValueType::Float,
            "bool" | "boolean" => ValueType::Boolean,
            "date" | "date-iso8601" => ValueType::Date,
            _ => ValueType::Other(trimmed.to_string()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Text => write!(f, "text"),
            ValueType::Integer => write!(f, "an integer"),
            ValueType::Float => write!(f, "a number"),
            ValueType::Boolean => write!(f, "true or false"),
            ValueType::Date => write!(f, "a date (YYYY-MM-DD)"),
            ValueType::Enum(choices) => write!(f, "one of [{}]", choices.join(", ")),
            ValueType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A configuration value after it has been checked against its option descriptor.
///
/// `Display` renders the wire string stored in `configuration_values`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    Choice(String),
}

impl ConfigValue {
    /// Parses user input for `option` according to its declared type.
    ///
    /// An empty (or blank) input always parses as an empty `Text`: clearing a
    /// field is allowed, and the validator reports the missing value.
    pub fn parse(option: &str, raw: &str, value_type: &ValueType) -> Result<Self, BuilderError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(ConfigValue::Text(String::new()));
        }

        let invalid = || BuilderError::InvalidValue {
            option: option.to_string(),
            expected: value_type.to_string(),
            found: raw.to_string(),
        };

        match value_type {
            ValueType::Text | ValueType::Other(_) => Ok(ConfigValue::Text(raw.to_string())),
            ValueType::Integer => trimmed
                .parse()
                .map(ConfigValue::Integer)
                .map_err(|_| invalid()),
            ValueType::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(ConfigValue::Float)
                .ok_or_else(invalid),
            ValueType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Ok(ConfigValue::Boolean(true)),
                "false" => Ok(ConfigValue::Boolean(false)),
                _ => Err(invalid()),
            },
            ValueType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(ConfigValue::Date)
                .map_err(|_| invalid()),
            ValueType::Enum(choices) => choices
                .iter()
                .find(|choice| choice.as_str() == trimmed)
                .map(|choice| ConfigValue::Choice(choice.clone()))
                .ok_or_else(invalid),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ConfigValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(s) | ConfigValue::Choice(s) => write!(f, "{}", s),
            ConfigValue::Integer(n) => write!(f, "{}", n),
            ConfigValue::Float(n) => write!(f, "{}", n),
            ConfigValue::Boolean(b) => write!(f, "{}", b),
            ConfigValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}
