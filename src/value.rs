//! Typed values carried by command options.
//!
//! Construction classifies its input: booleans become [`Value::Bool`],
//! strings become [`Value::FilePath`] when they name an existing file on
//! disk and [`Value::String`] otherwise, and string-keyed maps become
//! [`Value::VarDict`]. The file check happens once, at construction, so a
//! value's tag reflects the filesystem as it was at that moment.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CmakeError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Bool(bool),
    String(String),
    FilePath(PathBuf),
    VarDict(BTreeMap<String, Value>),
}

/// The tag half of a [`Value`], used for type checks and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    String,
    FilePath,
    VarDict,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
            Value::FilePath(_) => ValueKind::FilePath,
            Value::VarDict(_) => ValueKind::VarDict,
        }
    }

    /// Builds a variable dictionary from `(name, value)` entries.
    ///
    /// Entries are stored sorted by name, which is also the order they are
    /// rendered in when the dictionary is compiled into `-D`/`-U` tokens.
    pub fn vardict<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::VarDict(
            entries
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }
}

impl ValueKind {
    /// The type annotation cmake expects inside a `-D<name>:<type>=<value>`
    /// token.
    pub(crate) fn cmake_type(self) -> &'static str {
        match self {
            ValueKind::Bool => "BOOL",
            ValueKind::String => "STRING",
            ValueKind::FilePath => "FILEPATH",
            ValueKind::VarDict => "VARDICT",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::FilePath => "file path",
            ValueKind::VarDict => "variable dictionary",
        };
        f.write_str(name)
    }
}

fn classify(text: String) -> Value {
    if Path::new(&text).is_file() {
        Value::FilePath(PathBuf::from(text))
    } else {
        Value::String(text)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        classify(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        classify(text)
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        classify(path.display().to_string())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::VarDict(entries)
    }
}

/// Classification for dynamic input, e.g. values read from a JSON file.
///
/// Numbers, nulls and arrays have no cmake counterpart and are rejected
/// with [`CmakeError::InvalidValueKind`]; objects convert recursively.
impl TryFrom<serde_json::Value> for Value {
    type Error = CmakeError;

    fn try_from(raw: serde_json::Value) -> Result<Self> {
        match raw {
            serde_json::Value::Bool(flag) => Ok(flag.into()),
            serde_json::Value::String(text) => Ok(text.into()),
            serde_json::Value::Object(entries) => {
                let converted = entries
                    .into_iter()
                    .map(|(name, value)| Ok((name, Value::try_from(value)?)))
                    .collect::<Result<BTreeMap<_, _>>>()?;
                Ok(Value::VarDict(converted))
            }
            serde_json::Value::Null => Err(CmakeError::InvalidValueKind("null".into())),
            serde_json::Value::Number(_) => Err(CmakeError::InvalidValueKind("number".into())),
            serde_json::Value::Array(_) => Err(CmakeError::InvalidValueKind("array".into())),
        }
    }
}
