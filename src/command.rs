//! The configure, build and install commands.

use crate::error::{CmakeError, Result};
use crate::options::{ArgStyle, CommandOption};
use crate::value::Value;

/// A named bundle of options plus their assigned values.
///
/// Options keep their declaration order, and [`compile`](Self::compile)
/// renders them in that order, so `-D` defines always precede `-U` undefines
/// on the configure command. Values are assigned by option name
/// (case-insensitive) and type-checked against the option's declared kind.
#[derive(Debug, Clone)]
pub struct Command {
    name: &'static str,
    slots: Vec<(CommandOption, Option<Value>)>,
}

impl Command {
    /// The configure command.
    ///
    /// Options: `source_dir` (default `.`), `build_dir` (default `build`),
    /// `generator` (default `Ninja`), and the optional `initial_cache`,
    /// `toolset_spec`, `platform_name`, `toolchain`, `install_prefix`,
    /// plus the `variables`/`remove_vars` dictionaries. Anything beyond
    /// these goes through [`RawArgs`](crate::RawArgs).
    pub fn configure() -> Self {
        Self::new(
            "configure",
            vec![
                CommandOption::simple("source_dir", "-S", ArgStyle::Separate, Some(".")),
                CommandOption::simple("build_dir", "-B", ArgStyle::Separate, Some("build")),
                CommandOption::simple("generator", "-G", ArgStyle::Separate, Some("Ninja")),
                CommandOption::optional("initial_cache", "-C", ArgStyle::Separate),
                CommandOption::optional("toolset_spec", "-T", ArgStyle::Separate),
                CommandOption::optional("platform_name", "-A", ArgStyle::Separate),
                CommandOption::optional("toolchain", "--toolchain", ArgStyle::Separate),
                CommandOption::optional("install_prefix", "--install-prefix", ArgStyle::Separate),
                CommandOption::variables(false),
                CommandOption::variables(true),
            ],
        )
    }

    /// The build command.
    ///
    /// Options: `build_path` (default `.`), and the optional `max_jobs`,
    /// `configuration` and `verbose`.
    pub fn build() -> Self {
        Self::new(
            "build",
            vec![
                CommandOption::simple("build_path", "--build", ArgStyle::Separate, Some(".")),
                CommandOption::optional("max_jobs", "-j", ArgStyle::Separate),
                CommandOption::optional("configuration", "--config", ArgStyle::Separate),
                CommandOption::switch("verbose", "-v"),
            ],
        )
    }

    /// The install command.
    ///
    /// Options: `install_path` (default `_install`), and the optional
    /// `configuration`, `component`, `default_dir_perms`, `prefix`,
    /// `verbose` and `strip`.
    pub fn install() -> Self {
        Self::new(
            "install",
            vec![
                CommandOption::simple("install_path", "--install", ArgStyle::Separate, Some("_install")),
                CommandOption::optional("configuration", "--config", ArgStyle::Separate),
                CommandOption::optional("component", "--component", ArgStyle::Separate),
                CommandOption::optional(
                    "default_dir_perms",
                    "--default-directory-permissions",
                    ArgStyle::Separate,
                ),
                CommandOption::optional("prefix", "--prefix", ArgStyle::Separate),
                CommandOption::switch("verbose", "-v"),
                CommandOption::switch("strip", "--strip"),
            ],
        )
    }

    fn new(name: &'static str, options: Vec<CommandOption>) -> Self {
        Self {
            name,
            slots: options.into_iter().map(|option| (option, None)).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Assigns a batch of named values, consuming and returning the command
    /// so construction chains.
    pub fn with<I, S, V>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in values {
            self.set(name.as_ref(), value)?;
        }
        Ok(self)
    }

    /// The value currently assigned to `name`, if any.
    pub fn get(&self, name: &str) -> Result<Option<&Value>> {
        let (_, value) = self.slot(name)?;
        Ok(value.as_ref())
    }

    /// Assigns `value` to the option called `name`.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let (option, assigned) = self.slot_mut(name)?;
        if !option.kind().accepts(value.kind()) {
            return Err(CmakeError::TypeMismatch {
                option: option.name().into(),
                expected: option.kind(),
                found: value.kind(),
            });
        }
        *assigned = Some(value);
        Ok(())
    }

    /// Re-checks every assigned value against its option's declared kind.
    ///
    /// Assignment already enforces this, but compilation must not proceed on
    /// a command that somehow drifted, so the engine calls this first.
    pub fn validate(&self) -> Result<()> {
        for (option, value) in &self.slots {
            if let Some(value) = value {
                if !option.kind().accepts(value.kind()) {
                    return Err(CmakeError::TypeMismatch {
                        option: option.name().into(),
                        expected: option.kind(),
                        found: value.kind(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Renders every option in declaration order into one flat argument
    /// list. This is exactly the argv tail fed to the subprocess, before
    /// raw passthrough arguments.
    pub fn compile(&self) -> Result<Vec<String>> {
        let mut args = Vec::new();
        for (option, value) in &self.slots {
            args.extend(option.render(value.as_ref())?);
        }
        Ok(args)
    }

    fn slot(&self, name: &str) -> Result<&(CommandOption, Option<Value>)> {
        self.slots
            .iter()
            .find(|(option, _)| option.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CmakeError::UnknownOption(name.into()))
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut (CommandOption, Option<Value>)> {
        self.slots
            .iter_mut()
            .find(|(option, _)| option.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CmakeError::UnknownOption(name.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_compiles_its_defaults_in_declaration_order() {
        let args = Command::configure().compile().unwrap();
        assert_eq!(args, vec!["-S", ".", "-B", "build", "-G", "Ninja"]);
    }

    #[test]
    fn install_compiles_its_default_path() {
        let args = Command::install().compile().unwrap();
        assert_eq!(args, vec!["--install", "_install"]);
    }

    #[test]
    fn assigned_values_replace_defaults() {
        let configure = Command::configure()
            .with([("source_dir", "./proj"), ("generator", "Unix Makefiles")])
            .unwrap();
        let args = configure.compile().unwrap();
        assert_eq!(
            args,
            vec!["-S", "./proj", "-B", "build", "-G", "Unix Makefiles"]
        );
    }

    #[test]
    fn switches_append_their_bare_flag() {
        let mut build = Command::build();
        build.set("verbose", true).unwrap();
        assert_eq!(build.compile().unwrap(), vec!["--build", ".", "-v"]);

        build.set("verbose", false).unwrap();
        assert_eq!(build.compile().unwrap(), vec!["--build", "."]);
    }

    #[test]
    fn defines_come_before_undefines() {
        let mut configure = Command::configure();
        configure
            .set("variables", Value::vardict([("FOO", Value::from("bar"))]))
            .unwrap();
        configure
            .set("remove_vars", Value::vardict([("OLD", Value::from(""))]))
            .unwrap();

        let args = configure.compile().unwrap();
        let define = args.iter().position(|a| a == "-DFOO:STRING=bar").unwrap();
        let undefine = args.iter().position(|a| a == "-UOLD").unwrap();
        assert!(define < undefine);
    }

    #[test]
    fn constructing_with_a_mismatched_kind_fails() {
        let result = Command::build().with([("verbose", "notabool")]);
        assert!(matches!(
            result,
            Err(CmakeError::TypeMismatch { option, .. }) if option == "verbose"
        ));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut configure = Command::configure();
        configure.set("SOURCE_DIR", "./proj").unwrap();
        assert_eq!(
            configure.get("Source_Dir").unwrap(),
            Some(&Value::String("./proj".into()))
        );
    }

    #[test]
    fn unknown_names_are_rejected_on_read_and_write() {
        let mut build = Command::build();
        assert!(matches!(
            build.get("nope"),
            Err(CmakeError::UnknownOption(name)) if name == "nope"
        ));
        assert!(matches!(
            build.set("nope", "x"),
            Err(CmakeError::UnknownOption(_))
        ));
    }

    #[test]
    fn unset_options_read_back_as_absent() {
        let configure = Command::configure();
        assert_eq!(configure.get("toolchain").unwrap(), None);
    }

    #[test]
    fn validate_accepts_a_freshly_built_command() {
        let configure = Command::configure()
            .with([("platform_name", "x64")])
            .unwrap();
        configure.validate().unwrap();
    }
}
