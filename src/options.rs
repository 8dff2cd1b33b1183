//! Option descriptors and how they render into argv tokens.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CmakeError, Result};
use crate::value::{Value, ValueKind};

/// The value kind an option declares it accepts.
///
/// The string kind accepts both [`ValueKind::String`] and
/// [`ValueKind::FilePath`]: value classification is filesystem-sensitive, so
/// an option like `initial_cache` handed a path that names an existing file
/// must still type-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    Bool,
    Str,
    VarDict,
}

impl OptionKind {
    pub fn accepts(self, kind: ValueKind) -> bool {
        matches!(
            (self, kind),
            (OptionKind::Bool, ValueKind::Bool)
                | (OptionKind::Str, ValueKind::String)
                | (OptionKind::Str, ValueKind::FilePath)
                | (OptionKind::VarDict, ValueKind::VarDict)
        )
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OptionKind::Bool => "bool",
            OptionKind::Str => "string",
            OptionKind::VarDict => "variable dictionary",
        };
        f.write_str(name)
    }
}

/// How a flag and its value combine into argv tokens.
///
/// `Separate` produces two tokens (`-S <dir>` must be two argv entries for
/// the subprocess to see them as flag and value); `Joined` glues flag,
/// separator and value into a single token (`-DFOO=BAR` style).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgStyle {
    Separate,
    Joined(&'static str),
}

#[derive(Debug, Clone)]
enum OptionVariant {
    /// Renders flag + value, falling back to the default when unset.
    Simple {
        style: ArgStyle,
        default: Option<Value>,
    },
    /// Like `Simple`, but renders nothing when unset.
    Optional { style: ArgStyle },
    /// Boolean flag: renders the bare flag when true, nothing otherwise.
    Switch,
    /// Cache-variable injection: one `-D`/`-U` token per dictionary entry.
    Variables { remove: bool },
}

/// A single named command-line option.
///
/// Identity (equality and hash) covers only `(name, flag, kind)`; rendering
/// style and default are deliberately ignored so that descriptors can key a
/// mapping.
#[derive(Debug, Clone)]
pub struct CommandOption {
    name: &'static str,
    flag: &'static str,
    kind: OptionKind,
    variant: OptionVariant,
}

impl CommandOption {
    pub fn simple(
        name: &'static str,
        flag: &'static str,
        style: ArgStyle,
        default: Option<&str>,
    ) -> Self {
        Self {
            name,
            flag,
            kind: OptionKind::Str,
            variant: OptionVariant::Simple {
                style,
                default: default.map(Value::from),
            },
        }
    }

    pub fn optional(name: &'static str, flag: &'static str, style: ArgStyle) -> Self {
        Self {
            name,
            flag,
            kind: OptionKind::Str,
            variant: OptionVariant::Optional { style },
        }
    }

    pub fn switch(name: &'static str, flag: &'static str) -> Self {
        Self {
            name,
            flag,
            kind: OptionKind::Bool,
            variant: OptionVariant::Switch,
        }
    }

    /// The `-D` (define) or, with `remove` set, `-U` (undefine) variable
    /// injection option.
    pub fn variables(remove: bool) -> Self {
        let (name, flag) = if remove {
            ("remove_vars", "-U")
        } else {
            ("variables", "-D")
        };
        Self {
            name,
            flag,
            kind: OptionKind::VarDict,
            variant: OptionVariant::Variables { remove },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn flag(&self) -> &'static str {
        self.flag
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Renders this option with `value` into zero or more argv tokens.
    pub fn render(&self, value: Option<&Value>) -> Result<Vec<String>> {
        match &self.variant {
            OptionVariant::Simple { style, default } => {
                let value = value
                    .or(default.as_ref())
                    .ok_or_else(|| CmakeError::MissingValue(self.name.into()))?;
                self.check_kind(value)?;
                Ok(render_simple(self.flag, *style, value))
            }
            OptionVariant::Optional { style } => match value {
                Some(value) => {
                    self.check_kind(value)?;
                    Ok(render_simple(self.flag, *style, value))
                }
                None => Ok(Vec::new()),
            },
            OptionVariant::Switch => Ok(match value {
                Some(Value::Bool(true)) => vec![self.flag.to_string()],
                _ => Vec::new(),
            }),
            OptionVariant::Variables { remove } => self.render_variables(value, *remove),
        }
    }

    fn render_variables(&self, value: Option<&Value>, remove: bool) -> Result<Vec<String>> {
        let Some(value) = value else {
            return Ok(Vec::new());
        };
        let Value::VarDict(entries) = value else {
            return Err(self.mismatch(value));
        };

        let mut tokens = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            if let Value::VarDict(_) = entry {
                return Err(CmakeError::NestedMapping(name.clone()));
            }
            let token = if remove {
                format!("{}{}", self.flag, name.to_uppercase())
            } else {
                format!(
                    "{}{}:{}={}",
                    self.flag,
                    name.to_uppercase(),
                    entry.kind().cmake_type(),
                    scalar_text(entry)
                )
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn check_kind(&self, value: &Value) -> Result<()> {
        if self.kind.accepts(value.kind()) {
            Ok(())
        } else {
            Err(self.mismatch(value))
        }
    }

    fn mismatch(&self, value: &Value) -> CmakeError {
        CmakeError::TypeMismatch {
            option: self.name.into(),
            expected: self.kind,
            found: value.kind(),
        }
    }
}

impl PartialEq for CommandOption {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.flag == other.flag && self.kind == other.kind
    }
}

impl Eq for CommandOption {}

impl std::hash::Hash for CommandOption {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.name, self.flag, self.kind).hash(state);
    }
}

fn render_simple(flag: &str, style: ArgStyle, value: &Value) -> Vec<String> {
    let text = scalar_text(value);
    match style {
        ArgStyle::Separate => vec![flag.to_string(), text],
        ArgStyle::Joined(separator) => vec![format!("{flag}{separator}{text}")],
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Bool(flag) => if *flag { "ON" } else { "OFF" }.to_string(),
        Value::String(text) => text.clone(),
        Value::FilePath(path) => path.display().to_string(),
        Value::VarDict(_) => String::new(),
    }
}

/// Literal tokens appended verbatim after the compiled command arguments.
///
/// A flag that takes a separate value must be pushed as two entries
/// (`["--foo", "Bar"]`, not `["--foo Bar"]`) so the subprocess receives them
/// as distinct argv entries. Empty entries are dropped at construction.
#[derive(Debug, Clone, Default)]
pub struct RawArgs {
    args: Vec<String>,
}

impl RawArgs {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut raw = Self::default();
        for arg in args {
            raw.push(arg);
        }
        raw
    }

    pub fn push(&mut self, arg: impl Into<String>) {
        let arg = arg.into();
        if !arg.is_empty() {
            self.args.push(arg);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Options for [`initialize`](crate::initialize).
///
/// Loadable from a JSON file; absent fields take their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InitOptions {
    /// Write crate events to [`log_file`](Self::log_file).
    pub enable_logging: bool,
    pub log_file: PathBuf,
    /// Directory to search for the executable instead of `PATH`.
    pub cmake_path: Option<PathBuf>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            enable_logging: false,
            log_file: PathBuf::from("cmkit.log"),
            cmake_path: None,
        }
    }
}

impl InitOptions {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn simple_falls_back_to_its_default() {
        let generator = CommandOption::simple("generator", "-G", ArgStyle::Separate, Some("Ninja"));
        assert_eq!(generator.render(None).unwrap(), vec!["-G", "Ninja"]);
    }

    #[test]
    fn simple_without_value_or_default_is_an_error() {
        let opt = CommandOption::simple("generator", "-G", ArgStyle::Separate, None);
        assert!(matches!(
            opt.render(None),
            Err(CmakeError::MissingValue(name)) if name == "generator"
        ));
    }

    #[test]
    fn joined_style_produces_one_token() {
        let opt = CommandOption::simple("log_level", "--log-level", ArgStyle::Joined("="), None);
        let tokens = opt.render(Some(&Value::from("TRACE"))).unwrap();
        assert_eq!(tokens, vec!["--log-level=TRACE"]);
    }

    #[test]
    fn optional_renders_nothing_when_unset() {
        let platform = CommandOption::optional("platform_name", "-A", ArgStyle::Separate);
        assert!(platform.render(None).unwrap().is_empty());
        assert_eq!(
            platform.render(Some(&Value::from("x64"))).unwrap(),
            vec!["-A", "x64"]
        );
    }

    #[test]
    fn switch_renders_the_bare_flag_only_when_true() {
        let verbose = CommandOption::switch("verbose", "-v");
        assert_eq!(verbose.render(Some(&Value::from(true))).unwrap(), vec!["-v"]);
        assert!(verbose.render(Some(&Value::from(false))).unwrap().is_empty());
        assert!(verbose.render(None).unwrap().is_empty());
    }

    #[test]
    fn defines_render_name_type_and_value() {
        let defines = CommandOption::variables(false);
        let value = Value::vardict([
            ("foo", Value::from("bar")),
            ("fast", Value::from(true)),
        ]);
        let tokens = defines.render(Some(&value)).unwrap();
        assert_eq!(tokens, vec!["-DFAST:BOOL=ON", "-DFOO:STRING=bar"]);
    }

    #[test]
    fn file_valued_defines_carry_the_filepath_type() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let defines = CommandOption::variables(false);
        let value = Value::vardict([("TOOLCHAIN", Value::from(file.path().to_path_buf()))]);

        let tokens = defines.render(Some(&value)).unwrap();
        assert_eq!(
            tokens,
            vec![format!("-DTOOLCHAIN:FILEPATH={}", file.path().display())]
        );
    }

    #[test]
    fn undefines_ignore_the_entry_value() {
        let removes = CommandOption::variables(true);
        let value = Value::vardict([("foo", Value::from("whatever"))]);
        assert_eq!(removes.render(Some(&value)).unwrap(), vec!["-UFOO"]);
    }

    #[test]
    fn nested_dictionaries_are_rejected() {
        let defines = CommandOption::variables(false);
        let value = Value::vardict([("OUTER", Value::vardict([("inner", Value::from("x"))]))]);
        assert!(matches!(
            defines.render(Some(&value)),
            Err(CmakeError::NestedMapping(name)) if name == "OUTER"
        ));
    }

    #[test]
    fn rendering_a_mismatched_kind_fails() {
        let source = CommandOption::simple("source_dir", "-S", ArgStyle::Separate, Some("."));
        assert!(matches!(
            source.render(Some(&Value::from(true))),
            Err(CmakeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn descriptor_identity_ignores_style_and_default() {
        let a = CommandOption::simple("source_dir", "-S", ArgStyle::Separate, Some("."));
        let b = CommandOption::simple("source_dir", "-S", ArgStyle::Joined("="), None);
        assert_eq!(a, b);

        let c = CommandOption::simple("build_dir", "-B", ArgStyle::Separate, Some("."));
        assert_ne!(a, c);
    }

    #[test]
    fn raw_args_drop_empty_entries() {
        let raw = RawArgs::new(["--trace", "", "--foo", "Bar"]);
        assert_eq!(raw.iter().collect::<Vec<_>>(), ["--trace", "--foo", "Bar"]);
    }

    #[test]
    fn init_options_load_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"enable_logging": true, "log_file": "x.log"}}"#).unwrap();

        let options = InitOptions::from_json_file(file.path()).unwrap();
        assert!(options.enable_logging);
        assert_eq!(options.log_file, PathBuf::from("x.log"));
        assert_eq!(options.cmake_path, None);
    }
}
