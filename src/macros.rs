//! Macro expansion.
//!
//! A macro is named shorthand in a `run` list that expands into one
//! [`Command`] at compile time:
//!
//! ```yaml
//! run:
//!   - macro: python-activate-venv
//!     options: { shell: fish }
//!   - macro: goto-dir
//!     options: { dir: /var/log }
//! ```
//!
//! User-facing macros live in a fixed registry. `create-pane` is only used
//! by the compiler itself and cannot be named from a schema.

use crate::command::{Command, ShellCommand, ShellCommandOptions, WrapperCommand};
use crate::config::{decode_options, MacroCommand};
use crate::error::{ConjureError, Result};
use crate::plugin::{Backend, Plugin};
use crate::settings::{AppConfig, ShellDialect};
use serde::Deserialize;
use std::path::PathBuf;

/// Opens a new pane through the plugin's `create_pane`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePaneMacro {
    name: Option<String>,
}

impl CreatePaneMacro {
    /// Pane labeled `name`.
    pub fn new(name: Option<String>) -> Self {
        CreatePaneMacro { name }
    }

    fn expand(&self) -> Command {
        let name = self.name.clone();
        Command::Wrapper(WrapperCommand::new("create-pane", move |plugin: &mut Plugin| {
            plugin.create_pane(name.as_deref())
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GotoDirOptions {
    dir: PathBuf,
}

/// Moves the active pane through the plugin's `goto_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct GotoDirMacro {
    dir: PathBuf,
}

impl GotoDirMacro {
    /// Change to `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        GotoDirMacro { dir: dir.into() }
    }

    fn from_options(options: &serde_yaml::Mapping) -> Result<Macro> {
        let opts: GotoDirOptions = decode_options("macro 'goto-dir'", options)?;
        Ok(Macro::GotoDir(GotoDirMacro::new(opts.dir)))
    }

    fn expand(&self) -> Command {
        let dir = self.dir.clone();
        Command::Wrapper(WrapperCommand::new("goto-dir", move |plugin: &mut Plugin| {
            plugin.goto_dir(&dir)
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ActivateVenvOptions {
    cwd: Option<PathBuf>,
    shell: Option<String>,
}

/// Sources `<cwd>/.venv/bin/activate.<ext>` for the chosen shell.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivateVenvMacro {
    cwd: PathBuf,
    shell: Option<String>,
}

impl ActivateVenvMacro {
    /// Activate the venv under `cwd` (relative paths resolve in the pane's
    /// directory). `shell` falls back to the configured default shell.
    pub fn new(cwd: Option<PathBuf>, shell: Option<String>) -> Self {
        ActivateVenvMacro {
            cwd: cwd.unwrap_or_default(),
            shell,
        }
    }

    fn from_options(options: &serde_yaml::Mapping) -> Result<Macro> {
        let opts: ActivateVenvOptions = decode_options("macro 'python-activate-venv'", options)?;
        Ok(Macro::ActivateVenv(ActivateVenvMacro::new(opts.cwd, opts.shell)))
    }

    fn script_extension(shell: ShellDialect) -> &'static str {
        match shell {
            ShellDialect::Bash | ShellDialect::Zsh => "sh",
            ShellDialect::Fish => "fish",
        }
    }

    fn expand(&self, app_cfg: &AppConfig) -> Result<Command> {
        let shell = match &self.shell {
            Some(shell) => {
                log::trace!("Using provided shell {} for activate-venv macro", shell);
                shell.parse::<ShellDialect>()?
            }
            None => {
                log::trace!(
                    "Using default shell {} for activate-venv macro",
                    app_cfg.default_shell
                );
                app_cfg.default_shell
            }
        };

        let file = self
            .cwd
            .join(".venv")
            .join("bin")
            .join(format!("activate.{}", Self::script_extension(shell)));

        Ok(Command::Shell(ShellCommand::new(
            vec!["source".to_string(), file.to_string_lossy().into_owned()],
            ShellCommandOptions::default(),
        )))
    }
}

/// Every macro the compiler can expand.
#[derive(Debug, Clone, PartialEq)]
pub enum Macro {
    /// Engine-internal pane creation.
    CreatePane(CreatePaneMacro),
    /// `goto-dir`
    GotoDir(GotoDirMacro),
    /// `python-activate-venv`
    ActivateVenv(ActivateVenvMacro),
}

impl Macro {
    /// Expand into the command this macro stands for.
    ///
    /// # Errors
    ///
    /// Returns [`ConjureError::UnsupportedShell`] when `python-activate-venv`
    /// names a shell other than bash, zsh or fish.
    pub fn expand(&self, app_cfg: &AppConfig) -> Result<Command> {
        match self {
            Macro::CreatePane(m) => Ok(m.expand()),
            Macro::GotoDir(m) => Ok(m.expand()),
            Macro::ActivateVenv(m) => m.expand(app_cfg),
        }
    }
}

/// A user-facing macro: its schema name and how to build it from options.
pub struct MacroDefinition {
    /// Name used in `macro:` entries.
    pub name: &'static str,
    build: fn(&serde_yaml::Mapping) -> Result<Macro>,
}

impl MacroDefinition {
    /// Build the macro from its schema options.
    pub fn build(&self, options: &serde_yaml::Mapping) -> Result<Macro> {
        (self.build)(options)
    }
}

/// The fixed set of macros a schema may use.
static MACRO_REGISTRY: &[MacroDefinition] = &[
    // user-centred macros
    MacroDefinition {
        name: "python-activate-venv",
        build: ActivateVenvMacro::from_options,
    },
    // special macros
    MacroDefinition {
        name: "goto-dir",
        build: GotoDirMacro::from_options,
    },
];

/// Finds a macro definition in the registry by name.
pub fn find_macro(name: &str) -> Option<&'static MacroDefinition> {
    MACRO_REGISTRY.iter().find(|m| m.name == name)
}

/// Names of all registered macros, in registry order.
pub fn macro_names() -> impl Iterator<Item = &'static str> {
    MACRO_REGISTRY.iter().map(|m| m.name)
}

/// Resolve a schema macro entry into a [`Macro`].
///
/// # Errors
///
/// - [`ConjureError::MacroNotFound`] if the name is not registered
/// - [`ConjureError::InvalidOptions`] if the options don't fit the macro
pub fn resolve(cmd: &MacroCommand) -> Result<Macro> {
    let definition =
        find_macro(&cmd.name).ok_or_else(|| ConjureError::MacroNotFound(cmd.name.clone()))?;
    definition.build(&cmd.options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashSet;

    fn macro_cmd(name: &str, options: &str) -> MacroCommand {
        MacroCommand {
            name: name.to_string(),
            options: serde_yaml::from_str(options).unwrap(),
        }
    }

    fn venv_tokens(options: &str, app_cfg: &AppConfig) -> Result<Vec<String>> {
        let m = resolve(&macro_cmd("python-activate-venv", options))?;
        match m.expand(app_cfg)? {
            Command::Shell(shell) => Ok(shell.tokens()),
            other => panic!("expected shell command, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_names_are_unique() {
        let names: Vec<_> = macro_names().collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
        assert!(find_macro("create-pane").is_none());
    }

    #[test]
    fn test_unknown_macro_not_found() {
        let err = resolve(&macro_cmd("does-not-exist", "{}")).unwrap_err();
        assert!(matches!(err, ConjureError::MacroNotFound(ref n) if n == "does-not-exist"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_activate_venv_extension_per_shell() {
        let app_cfg = AppConfig::default();

        let fish = venv_tokens("{shell: fish}", &app_cfg).unwrap();
        assert_eq!(fish, vec!["source", ".venv/bin/activate.fish"]);

        for shell in ["bash", "zsh"] {
            let tokens = venv_tokens(&format!("{{shell: {}}}", shell), &app_cfg).unwrap();
            assert!(tokens[1].ends_with("activate.sh"));
        }

        let err = venv_tokens("{shell: powershell}", &app_cfg).unwrap_err();
        assert!(matches!(err, ConjureError::UnsupportedShell(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_activate_venv_uses_default_shell_and_cwd() {
        let app_cfg = AppConfig {
            default_shell: ShellDialect::Fish,
            ..AppConfig::default()
        };
        let tokens = venv_tokens("{cwd: /srv/app}", &app_cfg).unwrap();
        assert_eq!(tokens, vec!["source", "/srv/app/.venv/bin/activate.fish"]);
    }

    #[test]
    fn test_goto_dir_requires_dir() {
        let err = resolve(&macro_cmd("goto-dir", "{}")).unwrap_err();
        assert!(matches!(err, ConjureError::InvalidOptions { .. }));

        let m = resolve(&macro_cmd("goto-dir", "{dir: /tmp}")).unwrap();
        assert_eq!(m, Macro::GotoDir(GotoDirMacro::new("/tmp")));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = resolve(&macro_cmd("python-activate-venv", "{interpreter: pypy}")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
