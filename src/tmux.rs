//! tmux backend.
//!
//! Scripts are POSIX shell scripts (`<name>.sh`) that bootstrap a detached
//! session, open one window per pane and type commands into them with
//! `send-keys`, then attach. If a session of the same name already exists
//! the script attaches to it and exits before creating anything.
//!
//! # Window Indices
//!
//! tmux allows configuring `base-index`, so windows might start at 0 or 1.
//! The plugin tracks the current window itself; set `start_count_at_one`
//! to match a `base-index 1` setup.

use crate::command;
use crate::config::BackendType;
use crate::error::Result;
use crate::plugin::{prepare_dir, Backend};
use crate::script::ScriptStore;
use crate::settings::AppConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Options accepted under `backend: { name: tmux, options: ... }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TmuxOptions {
    /// Number windows from 1 instead of 0.
    pub start_count_at_one: bool,
    /// Fixed session name. The compiler suffixes it with the root pane name
    /// so every nested script gets its own session. A random one is
    /// generated per script otherwise.
    pub session_name: Option<String>,
    /// Turn `cd` targets into absolute paths.
    ///
    /// Child directories are joined onto the root pane directory as the
    /// root backend wrote it, so with a resolving root backend they are
    /// already absolute. Relative targets are read by the shell of each
    /// window, which starts in the directory the script was launched from.
    pub resolve_dirs: bool,
}

/// Shell-script generator for tmux.
#[derive(Debug, Clone)]
pub struct TmuxPlugin {
    options: TmuxOptions,
    scripts: ScriptStore,
    session_name: Option<String>,
    /// Zero-based count of windows opened so far, `None` before the first.
    window: Option<u32>,
}

impl TmuxPlugin {
    /// Plugin writing to `<data_folder>/tmux/`.
    pub fn new(app_cfg: &AppConfig, options: TmuxOptions) -> Self {
        TmuxPlugin {
            options,
            scripts: ScriptStore::new(&app_cfg.data_folder, BackendType::Tmux, "sh", true),
            session_name: None,
            window: None,
        }
    }

    /// Session name chosen by the last `pre_init`.
    pub fn session_name(&self) -> Option<&str> {
        self.session_name.as_deref()
    }

    /// tmux index of the active window.
    pub fn window_current_index(&self) -> u32 {
        let base = if self.options.start_count_at_one { 1 } else { 0 };
        self.window.unwrap_or(0) + base
    }

    fn window_increment_index(&mut self) -> u32 {
        self.window = Some(self.window.map_or(0, |index| index + 1));
        self.window_current_index()
    }

    fn send_keys(&self, keys: &str) -> Result<Vec<String>> {
        Ok(vec![format!(
            "tmux send-keys -t \"$SESSION_NAME\":{} {} C-m",
            self.window_current_index(),
            command::quote(keys)?
        )])
    }
}

impl Backend for TmuxPlugin {
    fn backend_type(&self) -> BackendType {
        BackendType::Tmux
    }

    fn scripts(&self) -> &ScriptStore {
        &self.scripts
    }

    fn pre_init(&mut self, session_name: Option<&str>) -> Result<Vec<String>> {
        self.window = None;
        let session_name = session_name
            .map(str::to_string)
            .or_else(|| self.options.session_name.clone())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        log::trace!("tmux session name: {}", session_name);

        let lines = vec![
            format!("SESSION_NAME={}", command::quote(&session_name)?),
            "if tmux has-session -t \"$SESSION_NAME\" 2>/dev/null; then".to_string(),
            "   tmux attach-session -t \"$SESSION_NAME\"".to_string(),
            "   exit 0".to_string(),
            "fi".to_string(),
            "tmux new-session -d -s \"$SESSION_NAME\"".to_string(),
        ];
        self.session_name = Some(session_name);
        Ok(lines)
    }

    fn post_init(&self) -> Vec<String> {
        vec!["tmux attach-session -t \"$SESSION_NAME\"".to_string()]
    }

    fn create_pane(&mut self, name: Option<&str>) -> Result<Vec<String>> {
        let label = match name {
            Some(name) => format!(" -n {}", command::quote(name)?),
            None => String::new(),
        };
        let index = self.window_increment_index();
        Ok(vec![format!(
            "tmux new-window -t \"$SESSION_NAME\":{} -k{}",
            index, label
        )])
    }

    fn goto_dir(&self, path: &Path) -> Result<Vec<String>> {
        let path = self.resolve_dir(path)?;
        let keys = format!("cd {}", command::quote(&path.to_string_lossy())?);
        self.send_keys(&keys)
    }

    fn run_cmd(&self, command: &[String]) -> Result<Vec<String>> {
        self.send_keys(&command::join(command)?)
    }

    fn resolve_dir(&self, path: &Path) -> Result<PathBuf> {
        prepare_dir(path, self.options.resolve_dirs)
    }

    fn configured_session_name(&self) -> Option<&str> {
        self.options.session_name.as_deref()
    }

    fn launch_cmd(&self, path: &Path) -> Result<Vec<String>> {
        Ok(vec![
            "bash".to_string(),
            "-c".to_string(),
            command::quote(&path.to_string_lossy())?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn plugin(root: &Path, options: TmuxOptions) -> TmuxPlugin {
        TmuxPlugin::new(&AppConfig::with_root(root), options)
    }

    #[test]
    fn test_pre_init_bootstraps_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut tmux = plugin(dir.path(), TmuxOptions::default());

        let lines = tmux.pre_init(Some("test_session")).unwrap();
        assert_eq!(lines[0], "SESSION_NAME=test_session");
        assert_eq!(lines[1], "if tmux has-session -t \"$SESSION_NAME\" 2>/dev/null; then");
        assert_eq!(lines.last().unwrap(), "tmux new-session -d -s \"$SESSION_NAME\"");
        assert_eq!(tmux.session_name(), Some("test_session"));
    }

    #[test]
    fn test_session_name_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut configured = plugin(
            dir.path(),
            TmuxOptions {
                session_name: Some("from_options".into()),
                ..TmuxOptions::default()
            },
        );
        configured.pre_init(None).unwrap();
        assert_eq!(configured.session_name(), Some("from_options"));
        configured.pre_init(Some("override")).unwrap();
        assert_eq!(configured.session_name(), Some("override"));

        let mut generated = plugin(dir.path(), TmuxOptions::default());
        generated.pre_init(None).unwrap();
        let name = generated.session_name().unwrap().to_string();
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_window_index_increments_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let mut tmux = plugin(dir.path(), TmuxOptions::default());
        tmux.pre_init(Some("s")).unwrap();

        assert_eq!(
            tmux.create_pane(Some("one")).unwrap(),
            vec!["tmux new-window -t \"$SESSION_NAME\":0 -k -n one"]
        );
        assert_eq!(
            tmux.create_pane(None).unwrap(),
            vec!["tmux new-window -t \"$SESSION_NAME\":1 -k"]
        );
        assert_eq!(
            tmux.run_cmd(&["echo".into(), "Hello".into()]).unwrap(),
            vec!["tmux send-keys -t \"$SESSION_NAME\":1 'echo Hello' C-m"]
        );

        tmux.pre_init(Some("s")).unwrap();
        assert_eq!(
            tmux.create_pane(Some("again")).unwrap(),
            vec!["tmux new-window -t \"$SESSION_NAME\":0 -k -n again"]
        );
    }

    #[test]
    fn test_start_count_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut tmux = plugin(
            dir.path(),
            TmuxOptions {
                start_count_at_one: true,
                ..TmuxOptions::default()
            },
        );
        tmux.pre_init(Some("s")).unwrap();
        tmux.create_pane(Some("first")).unwrap();
        assert_eq!(tmux.window_current_index(), 1);

        let line = &tmux.goto_dir(Path::new("/srv/my app")).unwrap()[0];
        assert!(line.starts_with("tmux send-keys -t \"$SESSION_NAME\":1 "));
        let tokens = command::split(line).unwrap();
        assert_eq!(command::split(&tokens[4]).unwrap(), vec!["cd", "/srv/my app"]);
    }

    #[test]
    fn test_quoting_keeps_one_logical_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut tmux = plugin(dir.path(), TmuxOptions::default());
        tmux.pre_init(Some("s")).unwrap();
        tmux.create_pane(Some("pane name")).unwrap();

        let line = &tmux.run_cmd(&["echo".into(), "a; rm -rf /".into()]).unwrap()[0];
        let tokens = command::split(line).unwrap();
        assert_eq!(tokens[0..3], ["tmux", "send-keys", "-t"]);
        assert_eq!(command::split(&tokens[4]).unwrap(), vec!["echo", "a; rm -rf /"]);
        assert_eq!(tokens[5], "C-m");
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_script_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut tmux = plugin(dir.path(), TmuxOptions::default());

        assert_eq!(
            tmux.get_script_cmd("test_script").unwrap_err().kind(),
            ErrorKind::NotFound
        );

        let mut lines = tmux.pre_init(Some("test_session")).unwrap();
        lines.extend(tmux.create_pane(Some("test_pane")).unwrap());
        lines.extend(tmux.run_cmd(&["bash".into()]).unwrap());
        lines.extend(tmux.post_init());
        let path = tmux.write_script("test_script", &lines).unwrap();
        assert!(path.ends_with("tmux/test_script.sh"));

        let cmd = tmux.get_script_cmd("test_script").unwrap();
        assert_eq!(cmd[..2], ["bash", "-c"]);
        assert!(cmd[2].ends_with("test_script.sh"));
        assert_eq!(cmd, tmux.get_script_cmd("test_script").unwrap());
        assert_eq!(cmd, tmux.launch_cmd(&std::path::absolute(&path).unwrap()).unwrap());

        tmux.remove_script("test_script").unwrap();
        assert_eq!(
            tmux.remove_script("test_script").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
