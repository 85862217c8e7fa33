//! Command-line interface for conjure.
//!
//! Parses arguments using clap and provides the [`Cli`] struct containing
//! all user-specified options.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for conjure.
///
/// # Examples
///
/// ```bash
/// # Compile the `webshop` schema and open it
/// conjure run webshop
///
/// # Only write the scripts
/// conjure compile webshop
///
/// # Start a new schema and edit it
/// conjure new webshop && conjure edit webshop
/// ```
#[derive(Parser, Debug)]
#[command(name = "conjure")]
#[command(version)]
#[command(about = "Terminal workspace compiler - open kitty tabs and tmux windows from a schema")]
#[command(long_about = "Conjure compiles YAML workspace schemas into kitty session files and\n\
    tmux scripts, then launches them.\n\n\
    Set RUST_LOG=debug (or trace) to see what gets compiled.")]
pub struct Cli {
    /// App config file (defaults to ~/.config/conjure/config.toml).
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a schema and launch it.
    Run {
        /// Schema name (file stem in the schemas folder).
        schema: String,
        /// Compile only, don't launch.
        #[arg(long)]
        no_exec: bool,
    },

    /// Compile a schema without launching it.
    Compile {
        /// Schema name.
        schema: String,
    },

    /// List all schemas.
    List,

    /// Create a schema from the starter template.
    New {
        /// Schema name.
        schema: String,
    },

    /// Open a schema in $EDITOR.
    Edit {
        /// Schema name.
        schema: String,
    },

    /// Copy a schema file into the schemas folder.
    Save {
        /// Schema file to copy.
        file: PathBuf,
        /// Name to store it under (defaults to the file stem).
        #[arg(short, long)]
        name: Option<String>,
        /// Replace an existing schema.
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a schema and its compiled scripts.
    Remove {
        /// Schema name.
        schema: String,
        /// Only delete the compiled scripts.
        #[arg(long)]
        keep_schema: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from(["conjure", "run", "shop", "--no-exec", "-c", "/tmp/c.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        match cli.command {
            Commands::Run { schema, no_exec } => {
                assert_eq!(schema, "shop");
                assert!(no_exec);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
