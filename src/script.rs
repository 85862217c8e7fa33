//! Script persistence and launching.
//!
//! Every backend keeps its scripts under `<data_folder>/<backend>/`. The
//! [`ScriptStore`] owns that folder for one backend; [`open_app`] starts
//! whatever command a backend returns for running a script.

use crate::config::BackendType;
use crate::error::{ConjureError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Folder of scripts for one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStore {
    folder: PathBuf,
    extension: &'static str,
    executable: bool,
}

impl ScriptStore {
    /// Store under `<data_folder>/<backend>/`, writing `<name>.<extension>`.
    pub fn new(data_folder: &Path, backend: BackendType, extension: &'static str, executable: bool) -> Self {
        ScriptStore {
            folder: data_folder.join(backend.as_str()),
            extension,
            executable,
        }
    }

    /// Folder holding the scripts.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Where the script `name` lives, whether or not it exists.
    pub fn path(&self, name: &str) -> PathBuf {
        self.folder.join(format!("{}.{}", name, self.extension))
    }

    /// Absolute path of an existing script.
    ///
    /// # Errors
    ///
    /// Returns [`ConjureError::ScriptNotFound`] if the script was never written.
    pub fn existing_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(ConjureError::ScriptNotFound {
                name: name.to_string(),
                path,
            });
        }
        Ok(std::path::absolute(&path)?)
    }

    /// Write `contents` newline-joined, without a trailing newline.
    pub fn write(&self, name: &str, contents: &[String]) -> Result<PathBuf> {
        fs::create_dir_all(&self.folder)?;
        let path = self.path(name);
        fs::write(&path, contents.join("\n"))?;
        if self.executable {
            ensure_executable(&path)?;
        }
        log::debug!("Wrote {} lines to {}", contents.len(), path.display());
        Ok(path)
    }

    /// Delete the script `name`.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(ConjureError::ScriptNotFound {
                name: name.to_string(),
                path,
            });
        }
        fs::remove_file(&path)?;
        log::debug!("Removed {}", path.display());
        Ok(())
    }
}

/// Make `path` executable for owner, group and others if it is not already.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 == 0o111 {
        log::trace!("{} is already executable", path.display());
        return Ok(());
    }
    permissions.set_mode(mode | 0o111);
    fs::set_permissions(path, permissions)?;
    log::trace!("Made {} executable", path.display());
    Ok(())
}

/// Windows has no executable bit; scripts run through their interpreter.
#[cfg(not(unix))]
pub fn ensure_executable(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ConjureError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Script not found: {}", path.display()),
        )));
    }
    Ok(())
}

/// Run a script launch command and wait for it.
///
/// On Windows the command goes through `cmd /C start` so GUI backends get
/// their own window; elsewhere it is spawned directly.
///
/// # Errors
///
/// - [`ConjureError::InvalidCommand`] for an empty command
/// - [`ConjureError::IoError`] if the program cannot be spawned
/// - [`ConjureError::ExecutionFailed`] on a non-zero exit status
pub fn open_app(run_cmd: &[String]) -> Result<()> {
    let (program, args) = run_cmd
        .split_first()
        .ok_or_else(|| ConjureError::InvalidCommand("empty launch command".into()))?;

    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start"]).arg(program);
        command
    } else {
        Command::new(program)
    };
    command.args(args);

    log::info!("Launching: {}", run_cmd.join(" "));
    let status = command.status()?;
    if !status.success() {
        return Err(ConjureError::ExecutionFailed(run_cmd.join(" ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_write_joins_lines_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScriptStore::new(dir.path(), BackendType::Kitty, "conf", false);

        let path = store.write("demo", &lines(&["new_tab a", "launch ls"])).unwrap();
        assert_eq!(path, dir.path().join("kitty").join("demo.conf"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "new_tab a\nlaunch ls");
    }

    #[test]
    fn test_existing_path_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScriptStore::new(dir.path(), BackendType::Tmux, "sh", true);

        let err = store.existing_path("demo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        store.write("demo", &lines(&["true"])).unwrap();
        let path = store.existing_path("demo").unwrap();
        assert!(path.is_absolute());

        store.remove("demo").unwrap();
        assert!(!path.exists());
        assert_eq!(store.remove("demo").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_bit_is_set() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = ScriptStore::new(dir.path(), BackendType::Tmux, "sh", true);
        let path = store.write("exec", &lines(&["true"])).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_open_app_rejects_empty_command() {
        assert!(matches!(open_app(&[]), Err(ConjureError::InvalidCommand(_))));
    }
}
