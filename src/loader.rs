//! Config and schema file discovery and loading.
//!
//! The app config search order is:
//!
//! 1. `--config <path>` when given
//! 2. `$XDG_CONFIG_HOME/conjure/config.toml`
//! 3. `~/.config/conjure/config.toml`
//! 4. Platform default (e.g., `~/Library/Application Support` on macOS)
//!
//! A missing default config is not an error; built-in defaults apply.
//! Schemas are `<schemas_folder>/<name>.yml` (or `.yaml`).

use crate::command;
use crate::config::Workspace;
use crate::error::{ConjureError, Result};
use crate::settings::{AppConfig, APP_NAME};
use std::fs;
use std::path::{Path, PathBuf};

/// Written by `conjure new`.
pub const SCHEMA_TEMPLATE: &str = r#"wizard:
  root:
    backend: kitty
    # nested:
    #   backend:
    #     name: tmux
    #     options:
    #       start_count_at_one: false

project:
  name: {name}
  # dir: ~/src/{name}
  setup:
    main:
      run:
        - "echo ready"
"#;

/// Determine the config file path.
///
/// Checks locations in order of preference:
/// 1. `$XDG_CONFIG_HOME/conjure/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/conjure/config.toml`
/// 3. Platform default via `dirs::config_dir()`
///
/// If no existing config is found, returns `~/.config/conjure/config.toml`.
///
/// # Errors
///
/// Returns [`ConjureError::NoConfigDir`] if the home directory cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg).join(APP_NAME).join("config.toml");
        if path.exists() {
            return Ok(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".config").join(APP_NAME).join("config.toml");
        if path.exists() {
            return Ok(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(APP_NAME).join("config.toml");
        if path.exists() {
            return Ok(path);
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME).join("config.toml"))
        .ok_or(ConjureError::NoConfigDir)
}

/// Load and parse an app config file, expanding `~` in its folders.
///
/// # Errors
///
/// - [`ConjureError::ConfigNotFound`] if the file doesn't exist
/// - [`ConjureError::IoError`] if reading fails
/// - [`ConjureError::ConfigParse`] if TOML parsing fails
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(ConjureError::ConfigNotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    let mut config: AppConfig = toml::from_str(&contents)?;
    config.data_folder = expand_home(&config.data_folder);
    config.schemas_folder = expand_home(&config.schemas_folder);
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load the config at `explicit`, or from the default path.
///
/// Only the default path may be missing, in which case defaults are used.
pub fn load_app_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let path = default_config_path()?;
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    load_config(&path)
}

fn expand_home(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Path of the schema `name`, trying `.yml` before `.yaml`.
///
/// # Errors
///
/// Returns [`ConjureError::SchemaNotFound`] if neither file exists.
pub fn schema_path(app_cfg: &AppConfig, name: &str) -> Result<PathBuf> {
    ["yml", "yaml"]
        .iter()
        .map(|ext| app_cfg.schemas_folder.join(format!("{}.{}", name, ext)))
        .find(|path| path.is_file())
        .ok_or_else(|| ConjureError::SchemaNotFound {
            name: name.to_string(),
            folder: app_cfg.schemas_folder.clone(),
        })
}

/// Read and parse a schema file.
pub fn load_workspace(path: &Path) -> Result<Workspace> {
    let contents = fs::read_to_string(path)?;
    let workspace = Workspace::from_yaml(&contents)?;
    log::debug!(
        "Loaded schema '{}' from {}",
        workspace.project.name,
        path.display()
    );
    Ok(workspace)
}

/// Find and parse the schema `name`.
pub fn load_schema(app_cfg: &AppConfig, name: &str) -> Result<Workspace> {
    load_workspace(&schema_path(app_cfg, name)?)
}

/// List all schema names, sorted alphabetically.
pub fn list_schemas(app_cfg: &AppConfig) -> Result<Vec<String>> {
    if !app_cfg.schemas_folder.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(&app_cfg.schemas_folder)? {
        let path = entry?.path();
        let is_schema = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yml") | Some("yaml")
        );
        if let (true, Some(stem)) = (is_schema, path.file_stem().and_then(|s| s.to_str())) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    names.dedup();
    Ok(names)
}

/// Create a new schema from [`SCHEMA_TEMPLATE`].
///
/// # Errors
///
/// Returns [`ConjureError::SchemaExists`] if a schema with this name exists.
pub fn create_schema(app_cfg: &AppConfig, name: &str) -> Result<PathBuf> {
    if let Ok(existing) = schema_path(app_cfg, name) {
        return Err(ConjureError::SchemaExists(existing));
    }
    fs::create_dir_all(&app_cfg.schemas_folder)?;
    let path = app_cfg.schemas_folder.join(format!("{}.yml", name));
    fs::write(&path, SCHEMA_TEMPLATE.replace("{name}", name))?;
    Ok(path)
}

/// Copy a schema file into the schemas folder after checking it parses.
///
/// The schema is stored as `<name>.yml`, `name` defaulting to the source
/// file stem. An existing schema is only replaced when `force` is set.
pub fn save_schema(app_cfg: &AppConfig, source: &Path, name: Option<&str>, force: bool) -> Result<PathBuf> {
    let contents = fs::read_to_string(source)?;
    Workspace::from_yaml(&contents)?;

    let name = match name {
        Some(name) => name.to_string(),
        None => source
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| ConjureError::InvalidSchema(format!("cannot name schema from {}", source.display())))?,
    };

    if let Ok(existing) = schema_path(app_cfg, &name) {
        if !force {
            return Err(ConjureError::SchemaExists(existing));
        }
        fs::remove_file(&existing)?;
    }

    fs::create_dir_all(&app_cfg.schemas_folder)?;
    let path = app_cfg.schemas_folder.join(format!("{}.yml", name));
    fs::write(&path, contents)?;
    Ok(path)
}

/// Program and arguments of an `$EDITOR` value, `vi` when unset or blank.
///
/// # Errors
///
/// Returns [`ConjureError::InvalidCommand`] if the value has broken quoting.
pub fn editor_command(editor: Option<&str>) -> Result<(String, Vec<String>)> {
    let mut tokens = command::split(editor.unwrap_or("vi"))?.into_iter();
    match tokens.next() {
        Some(program) => Ok((program, tokens.collect())),
        None => Ok(("vi".to_string(), Vec::new())),
    }
}

/// Delete the schema file `name`.
pub fn remove_schema(app_cfg: &AppConfig, name: &str) -> Result<PathBuf> {
    let path = schema_path(app_cfg, name)?;
    fs::remove_file(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn app(root: &Path) -> AppConfig {
        AppConfig::with_root(root)
    }

    #[test]
    fn test_new_schema_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let app_cfg = app(dir.path());

        let path = create_schema(&app_cfg, "demo").unwrap();
        assert_eq!(path, dir.path().join("schemas").join("demo.yml"));

        let workspace = load_schema(&app_cfg, "demo").unwrap();
        assert_eq!(workspace.project.name, "demo");
        assert!(matches!(
            create_schema(&app_cfg, "demo"),
            Err(ConjureError::SchemaExists(_))
        ));
    }

    #[test]
    fn test_schema_path_falls_back_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let app_cfg = app(dir.path());
        fs::create_dir_all(&app_cfg.schemas_folder).unwrap();
        fs::write(app_cfg.schemas_folder.join("other.yaml"), "x: 1").unwrap();

        assert!(schema_path(&app_cfg, "other").unwrap().ends_with("other.yaml"));
        let err = schema_path(&app_cfg, "missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_list_schemas_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let app_cfg = app(dir.path());
        assert!(list_schemas(&app_cfg).unwrap().is_empty());

        create_schema(&app_cfg, "zeta").unwrap();
        create_schema(&app_cfg, "alpha").unwrap();
        fs::write(app_cfg.schemas_folder.join("notes.txt"), "").unwrap();

        assert_eq!(list_schemas(&app_cfg).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_save_schema_validates_and_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let app_cfg = app(dir.path());

        let broken = dir.path().join("broken.yml");
        fs::write(&broken, "wizard: {}").unwrap();
        assert!(save_schema(&app_cfg, &broken, None, false).is_err());

        let good = dir.path().join("good.yml");
        fs::write(&good, SCHEMA_TEMPLATE.replace("{name}", "good")).unwrap();
        let saved = save_schema(&app_cfg, &good, None, false).unwrap();
        assert!(saved.ends_with("schemas/good.yml"));

        assert!(matches!(
            save_schema(&app_cfg, &good, None, false),
            Err(ConjureError::SchemaExists(_))
        ));
        save_schema(&app_cfg, &good, Some("renamed"), false).unwrap();
        save_schema(&app_cfg, &good, None, true).unwrap();
        assert_eq!(list_schemas(&app_cfg).unwrap(), vec!["good", "renamed"]);

        remove_schema(&app_cfg, "renamed").unwrap();
        assert_eq!(list_schemas(&app_cfg).unwrap(), vec!["good"]);
    }

    #[test]
    fn test_editor_command_splits_arguments() {
        assert_eq!(
            editor_command(Some("code -w")).unwrap(),
            ("code".to_string(), vec!["-w".to_string()])
        );
        assert_eq!(editor_command(None).unwrap(), ("vi".to_string(), Vec::new()));
        assert_eq!(editor_command(Some("  ")).unwrap(), ("vi".to_string(), Vec::new()));
        assert!(editor_command(Some("'unterminated")).is_err());
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = load_app_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConjureError::ConfigNotFound(_)));

        fs::write(&path, "default_shell = \"fish\"\ndata_folder = \"/var/lib/conjure\"").unwrap();
        let config = load_app_config(Some(&path)).unwrap();
        assert_eq!(config.data_folder, PathBuf::from("/var/lib/conjure"));
    }
}
