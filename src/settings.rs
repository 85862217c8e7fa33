//! Application settings.
//!
//! Settings come from `config.toml` (see [`crate::loader`]). Every key is
//! optional:
//!
//! ```toml
//! default_shell = "fish"
//! data_folder = "~/.local/share/conjure"
//! schemas_folder = "~/.config/conjure/schemas"
//!
//! [shell_command]
//! prefix = []
//! suffix = []
//! ```

use crate::command::ShellCommandOptions;
use crate::error::ConjureError;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Application directory name under the platform config/data folders.
pub const APP_NAME: &str = "conjure";

/// Shell dialects conjure knows how to emit commands for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellDialect {
    /// GNU bash.
    #[default]
    Bash,
    /// Z shell.
    Zsh,
    /// fish shell.
    Fish,
}

impl FromStr for ShellDialect {
    type Err = ConjureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bash" => Ok(ShellDialect::Bash),
            "zsh" => Ok(ShellDialect::Zsh),
            "fish" => Ok(ShellDialect::Fish),
            _ => Err(ConjureError::UnsupportedShell(s.to_string())),
        }
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShellDialect::Bash => "bash",
            ShellDialect::Zsh => "zsh",
            ShellDialect::Fish => "fish",
        };
        f.write_str(name)
    }
}

/// Settings shared by the compiler, every plugin and the CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shell used when a macro does not name one.
    pub default_shell: ShellDialect,
    /// Root folder for generated scripts, one sub-folder per backend.
    pub data_folder: PathBuf,
    /// Folder holding `<schema>.yml` files.
    pub schemas_folder: PathBuf,
    /// Tokens wrapped around every shell command from a schema.
    pub shell_command: ShellCommandOptions,
}

impl AppConfig {
    /// Settings rooted at a single folder, with data and schemas inside it.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        AppConfig {
            data_folder: root.join("data"),
            schemas_folder: root.join("schemas"),
            ..AppConfig::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_folder = dirs::data_local_dir()
            .map(|dir| dir.join(APP_NAME))
            .unwrap_or_else(|| PathBuf::from("./data"));
        let schemas_folder = dirs::config_dir()
            .map(|dir| dir.join(APP_NAME).join("schemas"))
            .unwrap_or_else(|| PathBuf::from("./schemas"));

        AppConfig {
            default_shell: ShellDialect::default(),
            data_folder,
            schemas_folder,
            shell_command: ShellCommandOptions::default(),
        }
    }
}
