//! # Conjure
//!
//! A terminal workspace compiler that turns YAML schemas into kitty session
//! files and tmux scripts.
//!
//! Describe a project once: which tabs to open, which directory each one
//! starts in, which commands run there, and which tabs host a nested tmux
//! session with windows of their own. Conjure compiles the description into
//! backend scripts and launches them.
//!
//! ## Features
//!
//! - **Backends**: kitty as the root terminal, tmux nested inside a tab
//! - **Directories**: project, pane and child-pane directories join into one path
//! - **Macros**: named shorthand such as `python-activate-venv` and `goto-dir`
//! - **Inheritance**: a nested tab's commands replay in every child window,
//!   with `run-before` for per-child setup
//!
//! ## Quick Example
//!
//! ```yaml
//! # ~/.config/conjure/schemas/webshop.yml
//! wizard:
//!   root:
//!     backend: kitty
//!     nested:
//!       backend: tmux
//!
//! project:
//!   name: webshop
//!   dir: ~/src/webshop
//!   setup:
//!     editor:
//!       run: ["nvim ."]
//!     backend:
//!       dir: api
//!       nested: true
//!       run:
//!         - macro: python-activate-venv
//!       panes:
//!         server: { run: ["make serve"] }
//!         tests:  { run: ["make watch-tests"] }
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into these modules:
//!
//! - [`config`]: Schema data structures
//! - [`settings`]: Application settings
//! - [`cli`]: Command-line argument parsing with clap
//! - [`loader`]: Config and schema file discovery and loading
//! - [`engine`]: Workspace compilation
//! - [`command`]: Executable units and shell quoting
//! - [`macros`]: Macro registry and expansion
//! - [`plugin`]: Backend interface
//! - [`kitty`]: kitty backend
//! - [`tmux`]: tmux backend
//! - [`script`]: Script persistence and launching
//! - [`error`]: Error types

pub mod cli;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod kitty;
pub mod loader;
pub mod macros;
pub mod plugin;
pub mod script;
pub mod settings;
pub mod tmux;

pub use config::{BackendType, RunCommand, Workspace};
pub use engine::{CompiledScripts, Engine};
pub use error::{ConjureError, ErrorKind, Result};
pub use plugin::{Backend, Plugin};
pub use settings::AppConfig;
