//! Backend plugin interface.
//!
//! [`Backend`] is the capability set every terminal backend implements:
//! line generators (`pre_init`, `create_pane`, `goto_dir`, `run_cmd`,
//! `post_init`) and script management (`write_script`, `run_script`,
//! `remove_script`, `get_script_cmd`). [`Plugin`] is the closed set of
//! implementations the compiler can instantiate.
//!
//! Line generators are pure string builders. Only the script operations
//! touch the filesystem or spawn processes.

use crate::config::{decode_options, BackendConfig, BackendType};
use crate::error::Result;
use crate::kitty::KittyPlugin;
use crate::script::{self, ScriptStore};
use crate::settings::AppConfig;
use crate::tmux::TmuxPlugin;
use std::path::{Path, PathBuf};

/// Operations a terminal backend provides to the compiler.
pub trait Backend {
    /// Which backend this is.
    fn backend_type(&self) -> BackendType;

    /// Script folder of this backend.
    fn scripts(&self) -> &ScriptStore;

    /// Lines that open a script, such as session bootstrap.
    ///
    /// Resets pane bookkeeping. `session_name` overrides any configured
    /// session name; backends that need one generate it when neither is set.
    fn pre_init(&mut self, session_name: Option<&str>) -> Result<Vec<String>>;

    /// Lines that close a script, such as attaching to the session.
    fn post_init(&self) -> Vec<String>;

    /// Lines that open a new pane, optionally labeled, and make it active.
    fn create_pane(&mut self, name: Option<&str>) -> Result<Vec<String>>;

    /// Lines that move the active pane to `path`.
    fn goto_dir(&self, path: &Path) -> Result<Vec<String>>;

    /// Lines that run `command` as one command in the active pane.
    fn run_cmd(&self, command: &[String]) -> Result<Vec<String>>;

    /// Directory as this backend writes it in `goto_dir`.
    fn resolve_dir(&self, path: &Path) -> Result<PathBuf>;

    /// Session name configured for this backend, if any.
    fn configured_session_name(&self) -> Option<&str> {
        None
    }

    /// Tokens another process runs to launch the script at `path`.
    ///
    /// `path` must be absolute. The script does not need to exist yet.
    fn launch_cmd(&self, path: &Path) -> Result<Vec<String>>;

    /// Tokens another process runs to launch the script `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConjureError::ScriptNotFound`] if the script does not exist.
    fn get_script_cmd(&self, name: &str) -> Result<Vec<String>> {
        let path = self.scripts().existing_path(name)?;
        self.launch_cmd(&path)
    }

    /// Persist `contents` as the script `name`.
    fn write_script(&self, name: &str, contents: &[String]) -> Result<PathBuf> {
        self.scripts().write(name, contents)
    }

    /// Delete the script `name`.
    fn remove_script(&self, name: &str) -> Result<()> {
        self.scripts().remove(name)
    }

    /// Launch the script `name` and wait for the launcher to exit.
    fn run_script(&self, name: &str) -> Result<()> {
        let cmd = self.get_script_cmd(name)?;
        script::open_app(&cmd)
    }
}

/// A backend instance, owned by one compile or run call.
#[derive(Debug)]
pub enum Plugin {
    /// kitty session files.
    Kitty(KittyPlugin),
    /// tmux shell scripts.
    Tmux(TmuxPlugin),
}

impl Plugin {
    /// Instantiate the backend named by `config`, decoding its options.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConjureError::InvalidOptions`] if the options don't
    /// fit the backend.
    pub fn new(config: &BackendConfig, app_cfg: &AppConfig) -> Result<Self> {
        let target = format!("backend '{}'", config.name);
        let plugin = match config.name {
            BackendType::Kitty => {
                Plugin::Kitty(KittyPlugin::new(app_cfg, decode_options(&target, &config.options)?))
            }
            BackendType::Tmux => {
                Plugin::Tmux(TmuxPlugin::new(app_cfg, decode_options(&target, &config.options)?))
            }
        };
        log::debug!("Instantiated {} plugin", config.name);
        Ok(plugin)
    }

    fn inner(&self) -> &dyn Backend {
        match self {
            Plugin::Kitty(plugin) => plugin,
            Plugin::Tmux(plugin) => plugin,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Backend {
        match self {
            Plugin::Kitty(plugin) => plugin,
            Plugin::Tmux(plugin) => plugin,
        }
    }
}

impl Backend for Plugin {
    fn backend_type(&self) -> BackendType {
        self.inner().backend_type()
    }

    fn scripts(&self) -> &ScriptStore {
        self.inner().scripts()
    }

    fn pre_init(&mut self, session_name: Option<&str>) -> Result<Vec<String>> {
        self.inner_mut().pre_init(session_name)
    }

    fn post_init(&self) -> Vec<String> {
        self.inner().post_init()
    }

    fn create_pane(&mut self, name: Option<&str>) -> Result<Vec<String>> {
        self.inner_mut().create_pane(name)
    }

    fn goto_dir(&self, path: &Path) -> Result<Vec<String>> {
        self.inner().goto_dir(path)
    }

    fn run_cmd(&self, command: &[String]) -> Result<Vec<String>> {
        self.inner().run_cmd(command)
    }

    fn resolve_dir(&self, path: &Path) -> Result<PathBuf> {
        self.inner().resolve_dir(path)
    }

    fn configured_session_name(&self) -> Option<&str> {
        self.inner().configured_session_name()
    }

    fn launch_cmd(&self, path: &Path) -> Result<Vec<String>> {
        self.inner().launch_cmd(path)
    }

    fn get_script_cmd(&self, name: &str) -> Result<Vec<String>> {
        self.inner().get_script_cmd(name)
    }

    fn write_script(&self, name: &str, contents: &[String]) -> Result<PathBuf> {
        self.inner().write_script(name, contents)
    }

    fn remove_script(&self, name: &str) -> Result<()> {
        self.inner().remove_script(name)
    }

    fn run_script(&self, name: &str) -> Result<()> {
        self.inner().run_script(name)
    }
}

/// Expand a leading `~` and, if `absolute`, anchor the path at the current
/// directory. The path is not required to exist.
pub fn prepare_dir(path: &Path, absolute: bool) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&raw).as_ref());
    if absolute {
        Ok(std::path::absolute(&expanded)?)
    } else {
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConjureError, ErrorKind};

    fn config(name: BackendType, yaml: &str) -> BackendConfig {
        BackendConfig {
            name,
            options: serde_yaml::from_str(yaml).unwrap(),
        }
    }

    #[test]
    fn test_new_dispatches_on_backend_type() {
        let dir = tempfile::tempdir().unwrap();
        let app = AppConfig::with_root(dir.path());

        let kitty = Plugin::new(&config(BackendType::Kitty, "{}"), &app).unwrap();
        assert_eq!(kitty.backend_type(), BackendType::Kitty);

        let tmux = Plugin::new(&config(BackendType::Tmux, "{start_count_at_one: true}"), &app).unwrap();
        assert_eq!(tmux.backend_type(), BackendType::Tmux);
        assert_eq!(tmux.scripts().folder(), dir.path().join("data").join("tmux"));
    }

    #[test]
    fn test_unknown_option_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = AppConfig::with_root(dir.path());

        let err = Plugin::new(&config(BackendType::Tmux, "{bogus: 1}"), &app).unwrap_err();
        assert!(matches!(err, ConjureError::InvalidOptions { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_prepare_dir() {
        let relative = prepare_dir(Path::new("src/app"), false).unwrap();
        assert_eq!(relative, PathBuf::from("src/app"));

        let absolute = prepare_dir(Path::new("src/app"), true).unwrap();
        assert!(absolute.is_absolute());
        assert!(absolute.ends_with("src/app"));

        if let Some(home) = dirs::home_dir() {
            let expanded = prepare_dir(Path::new("~/work"), false).unwrap();
            assert_eq!(expanded, home.join("work"));
        }
    }
}
