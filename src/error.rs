use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::options::OptionKind;
use crate::value::ValueKind;

pub type Result<T> = std::result::Result<T, CmakeError>;

/// Everything that can go wrong before or while driving the cmake executable.
///
/// All of these are fatal to the call that raised them; nothing is retried.
/// A non-zero exit code from cmake itself is *not* an error; it is reported
/// to registered workers through [`Worker::on_exit`](crate::Worker::on_exit).
#[derive(Debug, Error)]
pub enum CmakeError {
    /// A dynamic value could not be classified as bool, string or dictionary.
    #[error("unsupported value type: {0}")]
    InvalidValueKind(String),

    /// An assigned value's kind disagrees with the option's declared kind.
    #[error("incompatible value for option `{option}`: expected {expected}, got {found}")]
    TypeMismatch {
        option: String,
        expected: OptionKind,
        found: ValueKind,
    },

    /// A mandatory option was rendered with neither a value nor a default.
    #[error("option `{0}` has no value and no default")]
    MissingValue(String),

    /// A cache variable entry held a dictionary inside a dictionary.
    #[error("variable `{0}` must not hold a nested dictionary")]
    NestedMapping(String),

    #[error("option not found: {0}")]
    UnknownOption(String),

    /// `PATH` may never be replaced through environment overrides.
    #[error("overriding `{0}` directly is not allowed; register extra search paths instead")]
    ForbiddenOverride(String),

    #[error("cmake executable not found: {source}\nthe PATH variable contains:\n{path_dump}")]
    ExecutableNotFound {
        source: which::Error,
        path_dump: String,
    },

    /// The resolved executable did not pass the `--version` self-test.
    #[error("executable `{path}` failed the version probe: {reason}")]
    VersionProbe { path: PathBuf, reason: String },

    #[error("cmake is not initialized")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
