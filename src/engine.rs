//! Workspace compilation.
//!
//! The [`Engine`] turns a [`Workspace`] into backend scripts:
//!
//! 1. the root backend gets one tab per top-level pane,
//! 2. a nested root pane gets its own nested-backend script with one window
//!    per child pane, and the root tab launches that script,
//! 3. every script is written through its plugin.
//!
//! # Command Order
//!
//! Inside a child pane the order is fixed: create pane, change directory,
//! the child's `run-before`, the root pane's `run` (replayed in every
//! child), then the child's own `run`.
//!
//! # Directories
//!
//! Directories compose by joining: project `P`, root pane `R` and child `C`
//! give `P/R/C`. A missing segment is skipped; when every segment is
//! missing no `cd` is emitted.

use crate::command::{execute_all, Command, ShellCommand};
use crate::config::{BackendType, RunCommand, WizardConfig, Workspace};
use crate::error::{ConjureError, Result};
use crate::macros::{self, CreatePaneMacro, GotoDirMacro, Macro};
use crate::plugin::{Backend, Plugin};
use crate::settings::AppConfig;
use std::path::{Path, PathBuf};

/// Backends allowed to drive the root scope.
const ROOT_BACKENDS: &[BackendType] = &[BackendType::Kitty];

/// Backends allowed inside a nested root pane.
const NESTED_BACKENDS: &[BackendType] = &[BackendType::Tmux];

/// Join a pane's own directory onto its nearest ancestor's.
///
/// # Examples
///
/// ```
/// use conjure::engine::compose_dir;
/// use std::path::{Path, PathBuf};
///
/// let project = Some(Path::new("/srv/shop"));
/// assert_eq!(compose_dir(project, Some(Path::new("api"))), Some(PathBuf::from("/srv/shop/api")));
/// assert_eq!(compose_dir(project, None), Some(PathBuf::from("/srv/shop")));
/// assert_eq!(compose_dir(None, Some(Path::new("api"))), Some(PathBuf::from("api")));
/// assert_eq!(compose_dir(None, None), None);
/// ```
pub fn compose_dir(ancestor: Option<&Path>, own: Option<&Path>) -> Option<PathBuf> {
    match (ancestor, own) {
        (Some(ancestor), Some(own)) => Some(ancestor.join(own)),
        (Some(dir), None) | (None, Some(dir)) => Some(dir.to_path_buf()),
        (None, None) => None,
    }
}

/// Script name of the nested script opened from `pane` of `schema`.
pub fn child_script_name(schema: &str, pane: &str) -> String {
    format!("{}_{}", schema, pane)
}

/// Paths written by one [`Engine::compile`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledScripts {
    /// The root backend script.
    pub root: PathBuf,
    /// One nested script per nested root pane, in declaration order.
    pub children: Vec<PathBuf>,
}

/// Compiles workspaces into scripts and runs them.
#[derive(Debug, Clone)]
pub struct Engine {
    app_cfg: AppConfig,
}

impl Engine {
    /// Engine sharing `app_cfg` with every plugin it creates.
    pub fn new(app_cfg: AppConfig) -> Self {
        Engine { app_cfg }
    }

    /// Settings this engine was built with.
    pub fn app_config(&self) -> &AppConfig {
        &self.app_cfg
    }

    /// Instantiate the root plugin and, if `needs_nested`, the nested one.
    ///
    /// A nested backend that no pane uses is not instantiated. When
    /// `needs_nested` is set but no nested backend is configured, `None` is
    /// returned and the pane asking for it fails later.
    ///
    /// # Errors
    ///
    /// - [`ConjureError::UnsupportedRootBackend`] for a backend that cannot be root
    /// - [`ConjureError::UnsupportedNestedBackend`] for a backend that cannot be nested
    /// - [`ConjureError::InvalidOptions`] for bad backend options
    pub fn setup_plugins(&self, wizard: &WizardConfig, needs_nested: bool) -> Result<(Plugin, Option<Plugin>)> {
        let root_backend = wizard.root.backend.to_config();
        if !ROOT_BACKENDS.contains(&root_backend.name) {
            return Err(ConjureError::UnsupportedRootBackend(root_backend.name));
        }
        let root_plugin = Plugin::new(&root_backend, &self.app_cfg)?;

        let nested = match (&wizard.root.nested, needs_nested) {
            (Some(nested), true) => nested,
            (Some(_), false) => {
                log::debug!("Nested backend configured but no pane is nested, skipping it");
                return Ok((root_plugin, None));
            }
            (None, _) => return Ok((root_plugin, None)),
        };

        let nested_backend = nested.backend.to_config();
        if !NESTED_BACKENDS.contains(&nested_backend.name) {
            return Err(ConjureError::UnsupportedNestedBackend(nested_backend.name));
        }
        let nested_plugin = Plugin::new(&nested_backend, &self.app_cfg)?;

        Ok((root_plugin, Some(nested_plugin)))
    }

    /// Turn schema run entries into commands, expanding macros.
    ///
    /// # Errors
    ///
    /// - [`ConjureError::MacroNotFound`] for an unregistered macro
    /// - [`ConjureError::InvalidOptions`] or [`ConjureError::UnsupportedShell`]
    ///   for macros that cannot expand
    /// - [`ConjureError::InvalidCommand`] for a line with broken quoting
    pub fn gather(&self, cmds: &[RunCommand]) -> Result<Vec<Command>> {
        let opts = &self.app_cfg.shell_command;
        cmds.iter()
            .map(|cmd| match cmd {
                RunCommand::Line(line) => Ok(Command::Shell(ShellCommand::parse(line, opts.clone())?)),
                RunCommand::Tokens(tokens) => {
                    Ok(Command::Shell(ShellCommand::new(tokens.clone(), opts.clone())))
                }
                RunCommand::Macro(m) => macros::resolve(m)?.expand(&self.app_cfg),
            })
            .collect()
    }

    /// Check everything that can fail before any file is written.
    ///
    /// # Errors
    ///
    /// - [`ConjureError::RootPaneRunBefore`] if a root pane has `run-before`
    /// - [`ConjureError::MissingNestedBackend`] if a pane is nested but the
    ///   wizard has no nested backend
    /// - [`ConjureError::NoChildPanes`] if a nested pane declares no children
    /// - any error of [`Engine::gather`] for any pane's commands
    pub fn validate(&self, workspace: &Workspace) -> Result<()> {
        for (name, pane) in workspace.project.setup.iter() {
            if !pane.run_before.is_empty() {
                return Err(ConjureError::RootPaneRunBefore(name.to_string()));
            }
            self.gather(&pane.run)?;

            if !pane.nested {
                continue;
            }
            if workspace.wizard.root.nested.is_none() {
                return Err(ConjureError::MissingNestedBackend(name.to_string()));
            }
            let children = match &pane.panes {
                Some(children) if !children.is_empty() => children,
                _ => return Err(ConjureError::NoChildPanes(name.to_string())),
            };
            for (_, child) in children.iter() {
                self.gather(&child.run_before)?;
                self.gather(&child.run)?;
            }
        }
        Ok(())
    }

    /// Create-pane and, if a directory resolved, goto-dir commands.
    fn pane_preamble(&self, name: &str, dir: Option<&Path>) -> Result<Vec<Command>> {
        let mut commands =
            vec![Macro::CreatePane(CreatePaneMacro::new(Some(name.to_string()))).expand(&self.app_cfg)?];
        if let Some(dir) = dir {
            commands.push(Macro::GotoDir(GotoDirMacro::new(dir)).expand(&self.app_cfg)?);
        }
        Ok(commands)
    }

    /// Compile `workspace` into scripts named after `schema_name`.
    ///
    /// Writes `<schema_name>` for the root backend and
    /// `<schema_name>_<pane>` for every nested root pane. A configured
    /// nested session name is suffixed with the root pane name, so two
    /// nested panes never share a session.
    ///
    /// # Errors
    ///
    /// Everything [`Engine::validate`] and [`Engine::setup_plugins`] report,
    /// plus line generation and I/O errors. Every line is generated before
    /// the first write, so only I/O errors can leave earlier scripts behind.
    pub fn compile(&self, workspace: &Workspace, schema_name: &str) -> Result<CompiledScripts> {
        self.validate(workspace)?;
        let (mut root_plugin, mut nested_plugin) =
            self.setup_plugins(&workspace.wizard, workspace.has_nested_panes())?;
        log::trace!("Starting compilation of '{}'", schema_name);
        log::trace!(
            "Root plugin: {}, nested plugin: {}",
            root_plugin.backend_type(),
            nested_plugin
                .as_ref()
                .map_or("none", |plugin| plugin.backend_type().as_str())
        );

        let project_dir = workspace.project.dir.as_deref();
        let mut root_script = root_plugin.pre_init(None)?;
        let mut child_scripts: Vec<(String, Vec<String>)> = Vec::new();

        for (root_pane_name, root_pane) in workspace.project.setup.iter() {
            let root_pane_dir = compose_dir(project_dir, root_pane.dir.as_deref());
            let mut root_cmds = self.pane_preamble(root_pane_name, root_pane_dir.as_deref())?;

            if !root_pane.nested {
                root_cmds.extend(self.gather(&root_pane.run)?);
                root_script.extend(execute_all(&root_cmds, &mut root_plugin)?);
                continue;
            }

            let nested = nested_plugin
                .as_mut()
                .ok_or_else(|| ConjureError::MissingNestedBackend(root_pane_name.to_string()))?;
            let children = root_pane
                .panes
                .as_ref()
                .filter(|panes| !panes.is_empty())
                .ok_or_else(|| ConjureError::NoChildPanes(root_pane_name.to_string()))?;

            // children start from the directory the root tab actually moved to
            let base_dir = root_pane_dir
                .as_deref()
                .map(|dir| root_plugin.resolve_dir(dir))
                .transpose()?;
            let session_name = nested
                .configured_session_name()
                .map(|name| format!("{}_{}", name, root_pane_name));

            let mut child_script = nested.pre_init(session_name.as_deref())?;
            for (child_pane_name, child_pane) in children.iter() {
                let child_pane_dir = compose_dir(base_dir.as_deref(), child_pane.dir.as_deref());
                let mut child_cmds = self.pane_preamble(child_pane_name, child_pane_dir.as_deref())?;

                // run-before, then the parent's run, then the child's run
                child_cmds.extend(self.gather(&child_pane.run_before)?);
                child_cmds.extend(self.gather(&root_pane.run)?);
                child_cmds.extend(self.gather(&child_pane.run)?);

                child_script.extend(execute_all(&child_cmds, nested)?);
            }
            child_script.extend(nested.post_init());

            // the root plugin launches the nested script
            let child_name = child_script_name(schema_name, root_pane_name);
            let child_path = std::path::absolute(nested.scripts().path(&child_name))?;
            root_cmds.push(Command::Shell(ShellCommand::new(
                nested.launch_cmd(&child_path)?,
                self.app_cfg.shell_command.clone(),
            )));
            root_script.extend(execute_all(&root_cmds, &mut root_plugin)?);
            child_scripts.push((child_name, child_script));
        }
        root_script.extend(root_plugin.post_init());

        let mut children = Vec::with_capacity(child_scripts.len());
        if let Some(nested) = &nested_plugin {
            for (child_name, child_script) in &child_scripts {
                children.push(nested.write_script(child_name, child_script)?);
            }
        }
        let root = root_plugin.write_script(schema_name, &root_script)?;
        log::info!("Compiled '{}' into {}", schema_name, root.display());

        Ok(CompiledScripts { root, children })
    }

    /// Launch the compiled root script of `schema_name`.
    ///
    /// Only the root plugin is instantiated; nothing is recompiled.
    ///
    /// # Errors
    ///
    /// - [`ConjureError::ScriptNotFound`] if the schema was never compiled
    /// - [`ConjureError::ExecutionFailed`] if the launcher exits non-zero
    pub fn run(&self, workspace: &Workspace, schema_name: &str) -> Result<()> {
        let (root_plugin, _) = self.setup_plugins(&workspace.wizard, false)?;
        root_plugin.run_script(schema_name)
    }

    /// Delete the scripts [`Engine::compile`] writes for `schema_name`.
    ///
    /// Nested scripts go first, the root script last.
    ///
    /// # Errors
    ///
    /// Returns [`ConjureError::ScriptNotFound`] for the first missing script.
    pub fn remove(&self, workspace: &Workspace, schema_name: &str) -> Result<()> {
        let (root_plugin, nested_plugin) =
            self.setup_plugins(&workspace.wizard, workspace.has_nested_panes())?;

        if let Some(nested) = &nested_plugin {
            for (name, _) in workspace.project.setup.iter().filter(|(_, pane)| pane.nested) {
                nested.remove_script(&child_script_name(schema_name, name))?;
            }
        }
        root_plugin.remove_script(schema_name)
    }
}
