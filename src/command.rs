//! Executable units of a compiled pane.
//!
//! A [`Command`] turns into backend lines when executed against a
//! [`Plugin`]. Shell commands go through the plugin's `run_cmd`; wrapper
//! commands call any plugin operation bound at construction time, which is
//! how `create_pane` and `goto_dir` end up in the same list as user commands.

use crate::error::{ConjureError, Result};
use crate::plugin::{Backend, Plugin};
use serde::Deserialize;
use std::fmt;

/// Split a command line with POSIX shell rules.
///
/// # Errors
///
/// Returns [`ConjureError::InvalidCommand`] on unbalanced quotes or a
/// dangling escape.
pub fn split(line: &str) -> Result<Vec<String>> {
    shlex::split(line).ok_or_else(|| ConjureError::InvalidCommand(line.to_string()))
}

/// Quote one word so a POSIX shell reads it back unchanged.
pub fn quote(word: &str) -> Result<String> {
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .map_err(|e| ConjureError::InvalidCommand(format!("{}: {:?}", e, word)))
}

/// Quote and join tokens into one shell command line.
pub fn join(tokens: &[String]) -> Result<String> {
    shlex::try_join(tokens.iter().map(String::as_str))
        .map_err(|e| ConjureError::InvalidCommand(format!("{}: {:?}", e, tokens)))
}

/// Tokens wrapped around every schema shell command.
///
/// ```toml
/// [shell_command]
/// prefix = ["nice", "-n", "10"]
/// suffix = []
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShellCommandOptions {
    /// Tokens placed before the command.
    pub prefix: Vec<String>,
    /// Tokens placed after the command.
    pub suffix: Vec<String>,
}

/// A verbatim command run inside the active pane.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellCommand {
    tokens: Vec<String>,
    opts: ShellCommandOptions,
}

impl ShellCommand {
    /// Build from pre-split tokens.
    pub fn new(tokens: Vec<String>, opts: ShellCommandOptions) -> Self {
        ShellCommand { tokens, opts }
    }

    /// Build from a command line, splitting it with shell rules.
    pub fn parse(line: &str, opts: ShellCommandOptions) -> Result<Self> {
        Ok(ShellCommand::new(split(line)?, opts))
    }

    /// Prefix, own tokens and suffix in the order they are sent.
    pub fn tokens(&self) -> Vec<String> {
        self.opts
            .prefix
            .iter()
            .chain(&self.tokens)
            .chain(&self.opts.suffix)
            .cloned()
            .collect()
    }

    fn run(&self, plugin: &Plugin) -> Result<Vec<String>> {
        plugin.run_cmd(&self.tokens())
    }
}

type PluginCall = Box<dyn Fn(&mut Plugin) -> Result<Vec<String>>>;

/// A plugin operation with its arguments already bound.
pub struct WrapperCommand {
    label: String,
    call: PluginCall,
}

impl WrapperCommand {
    /// Wrap `call`; `label` only shows up in debug output.
    pub fn new<F>(label: impl Into<String>, call: F) -> Self
    where
        F: Fn(&mut Plugin) -> Result<Vec<String>> + 'static,
    {
        WrapperCommand {
            label: label.into(),
            call: Box::new(call),
        }
    }
}

impl fmt::Debug for WrapperCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperCommand")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A unit of work producing backend lines.
#[derive(Debug)]
pub enum Command {
    /// Runs a shell command through `run_cmd`.
    Shell(ShellCommand),
    /// Calls a bound plugin operation.
    Wrapper(WrapperCommand),
}

impl Command {
    /// Produce the backend lines for this command.
    ///
    /// Wrapper commands may advance plugin state (a new tmux window moves
    /// the window index), so commands must run in emission order.
    pub fn execute(&self, plugin: &mut Plugin) -> Result<Vec<String>> {
        match self {
            Command::Shell(cmd) => cmd.run(plugin),
            Command::Wrapper(cmd) => (cmd.call)(plugin),
        }
    }
}

/// Execute commands in order and collect all their lines.
pub fn execute_all(commands: &[Command], plugin: &mut Plugin) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for command in commands {
        lines.extend(command.execute(plugin)?);
    }
    Ok(lines)
}
