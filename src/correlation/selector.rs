//! `(key=value)` selector filters.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::resource::Properties;

/// Errors from parsing a selector filter string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Selector must be wrapped in parentheses: {input}")]
    Unbalanced { input: String },

    #[error("Selector has no '=' operator: {input}")]
    MissingOperator { input: String },

    #[error("Selector has an empty key: {input}")]
    EmptyKey { input: String },
}

/// Right-hand side of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorValue {
    /// `(key=*)`: the property must be present.
    Present,
    /// `(key=abc*)`: the property must start with the prefix.
    Prefix(String),
    /// `(key=abc)`: exact match.
    Exact(String),
}

/// A single-clause selector filter, resolved against resource properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    key: String,
    value: SelectorValue,
}

impl Selector {
    /// Exact-match selector.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: SelectorValue::Exact(value.into()),
        }
    }

    /// Presence selector, `(key=*)`.
    pub fn present(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: SelectorValue::Present,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &SelectorValue {
        &self.value
    }

    /// Check whether a property set satisfies this selector.
    pub fn matches(&self, properties: &Properties) -> bool {
        let Some(actual) = properties.get(&self.key) else {
            return false;
        };
        let actual = actual.to_filter_string();

        match &self.value {
            SelectorValue::Present => true,
            SelectorValue::Prefix(prefix) => actual.starts_with(prefix.as_str()),
            SelectorValue::Exact(expected) => actual == *expected,
        }
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| SelectorError::Unbalanced {
                input: input.to_string(),
            })?;

        let (key, value) = inner
            .split_once('=')
            .ok_or_else(|| SelectorError::MissingOperator {
                input: input.to_string(),
            })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(SelectorError::EmptyKey {
                input: input.to_string(),
            });
        }

        let value = match value {
            "*" => SelectorValue::Present,
            v if v.ends_with('*') => SelectorValue::Prefix(v.trim_end_matches('*').to_string()),
            v => SelectorValue::Exact(v.to_string()),
        };

        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            SelectorValue::Present => write!(f, "({}=*)", self.key),
            SelectorValue::Prefix(prefix) => write!(f, "({}={prefix}*)", self.key),
            SelectorValue::Exact(value) => write!(f, "({}={value})", self.key),
        }
    }
}
