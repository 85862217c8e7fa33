//! kitty backend.
//!
//! Scripts are kitty session files (`<name>.conf`) made of `new_tab`, `cd`
//! and `launch` directives. Every directive targets the most recently
//! opened tab, so the plugin keeps no pane state.

use crate::command;
use crate::config::BackendType;
use crate::error::{ConjureError, Result};
use crate::plugin::{prepare_dir, Backend};
use crate::script::ScriptStore;
use crate::settings::AppConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options accepted under `backend: { name: kitty, options: ... }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KittyOptions {
    /// Expand `~` and turn `cd` targets into absolute paths.
    pub resolve_dirs: bool,
}

impl Default for KittyOptions {
    fn default() -> Self {
        KittyOptions { resolve_dirs: true }
    }
}

/// Session-file generator for kitty.
#[derive(Debug, Clone)]
pub struct KittyPlugin {
    options: KittyOptions,
    scripts: ScriptStore,
}

impl KittyPlugin {
    /// Plugin writing to `<data_folder>/kitty/`.
    pub fn new(app_cfg: &AppConfig, options: KittyOptions) -> Self {
        KittyPlugin {
            options,
            scripts: ScriptStore::new(&app_cfg.data_folder, BackendType::Kitty, "conf", false),
        }
    }
}

/// Session directives end at the newline, so values must stay on one line.
fn single_line(value: &str) -> Result<&str> {
    if value.contains(['\n', '\r']) {
        return Err(ConjureError::InvalidCommand(format!(
            "kitty session values cannot span lines: {:?}",
            value
        )));
    }
    Ok(value)
}

impl Backend for KittyPlugin {
    fn backend_type(&self) -> BackendType {
        BackendType::Kitty
    }

    fn scripts(&self) -> &ScriptStore {
        &self.scripts
    }

    fn pre_init(&mut self, _session_name: Option<&str>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn post_init(&self) -> Vec<String> {
        Vec::new()
    }

    fn create_pane(&mut self, name: Option<&str>) -> Result<Vec<String>> {
        match name {
            Some(name) => Ok(vec![format!("new_tab {}", single_line(name)?)]),
            None => Ok(vec!["new_tab".to_string()]),
        }
    }

    fn goto_dir(&self, path: &Path) -> Result<Vec<String>> {
        let path = self.resolve_dir(path)?;
        Ok(vec![format!("cd {}", single_line(&path.to_string_lossy())?)])
    }

    fn run_cmd(&self, command: &[String]) -> Result<Vec<String>> {
        let joined = command::join(command)?;
        Ok(vec![format!("launch {}", single_line(&joined)?)])
    }

    fn resolve_dir(&self, path: &Path) -> Result<PathBuf> {
        prepare_dir(path, self.options.resolve_dirs)
    }

    fn launch_cmd(&self, path: &Path) -> Result<Vec<String>> {
        Ok(vec![
            "kitty".to_string(),
            "--detach".to_string(),
            "--session".to_string(),
            path.to_string_lossy().into_owned(),
        ])
    }
}
