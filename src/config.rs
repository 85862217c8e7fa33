//! Schema types for conjure.
//!
//! This module defines the data structures that map to a workspace schema
//! file. A schema has two top-level keys:
//!
//! - `wizard` selects the root backend and, optionally, a nested backend
//! - `project` describes the panes to open and what runs in them
//!
//! # Schema Format
//!
//! ```yaml
//! wizard:
//!   root:
//!     backend: kitty
//!     nested:
//!       backend:
//!         name: tmux
//!         options:
//!           start_count_at_one: true
//!
//! project:
//!   name: webshop
//!   dir: ~/src/webshop
//!   setup:
//!     editor:
//!       dir: frontend
//!       run: ["nvim ."]
//!     servers:
//!       nested: true
//!       run:
//!         - macro: python-activate-venv
//!       panes:
//!         api:
//!           dir: api
//!           run: ["uvicorn app:main --reload"]
//!         worker:
//!           run-before: ["export QUEUE=default"]
//!           run: [["celery", "-A", "tasks", "worker"]]
//! ```

use crate::error::{ConjureError, Result};
use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

/// A macro invocation inside a `run` or `run-before` list.
///
/// ```yaml
/// run:
///   - macro: python-activate-venv
///     options:
///       shell: fish
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MacroCommand {
    /// Registry name of the macro.
    #[serde(rename = "macro")]
    pub name: String,
    /// Free-form options, decoded by the macro itself.
    #[serde(default)]
    pub options: serde_yaml::Mapping,
}

/// One entry of a `run` or `run-before` list.
///
/// Accepts a shell line, an explicit token list or a macro invocation:
/// ```yaml
/// run:
///   - "npm run dev -- --port 3000"
///   - ["echo", "two words"]
///   - macro: goto-dir
///     options: { dir: /tmp }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RunCommand {
    /// A shell command line, split with POSIX shell rules.
    Line(String),
    /// Pre-split command tokens.
    Tokens(Vec<String>),
    /// A macro, expanded at compile time. Tried last: serde also accepts
    /// a struct written as a sequence, which would swallow token lists.
    Macro(MacroCommand),
}

/// Mapping of pane names to entries that keeps declaration order.
///
/// Pane order decides tab and window order, so the schema mapping is
/// read into a vector instead of a hash map.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneMap<T>(Vec<(String, T)>);

impl<T> PaneMap<T> {
    /// Iterate `(name, entry)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Look up an entry by pane name.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.iter().find(|(n, _)| *n == name).map(|(_, entry)| entry)
    }

    /// Whether the mapping declares no panes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for PaneMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PaneMapVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for PaneMapVisitor<T> {
            type Value = PaneMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of pane names to pane entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, T)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, entry)) = map.next_entry::<String, T>()? {
                    if entries.iter().any(|(existing, _)| *existing == name) {
                        return Err(de::Error::custom(format!("duplicate pane name `{}`", name)));
                    }
                    entries.push((name, entry));
                }
                Ok(PaneMap(entries))
            }
        }

        deserializer.deserialize_map(PaneMapVisitor(PhantomData))
    }
}

/// Decode a free-form options mapping into the typed options of `target`.
///
/// # Errors
///
/// Returns [`ConjureError::InvalidOptions`] on unknown keys or wrong types.
pub fn decode_options<T: DeserializeOwned>(target: &str, options: &serde_yaml::Mapping) -> Result<T> {
    serde_yaml::from_value(serde_yaml::Value::Mapping(options.clone())).map_err(|e| {
        ConjureError::InvalidOptions {
            target: target.to_string(),
            message: e.to_string(),
        }
    })
}

/// A child pane inside a nested root pane.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaneEntry {
    /// Directory relative to the parent pane's resolved directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Commands run after the inherited root-pane commands.
    #[serde(default)]
    pub run: Vec<RunCommand>,
    /// Commands run before the inherited root-pane commands.
    #[serde(default, rename = "run-before", alias = "run_before")]
    pub run_before: Vec<RunCommand>,
}

/// A top-level pane (a tab of the root backend).
///
/// # Example
///
/// ```yaml
/// servers:
///   dir: services
///   nested: true
///   run: ["source .env"]
///   panes:
///     api: { run: ["make api"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RootPaneEntry {
    /// Directory relative to the project directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Commands for this pane. For nested panes they are replayed in every child.
    #[serde(default)]
    pub run: Vec<RunCommand>,
    /// Never allowed on a root pane; kept so the compiler can reject it.
    #[serde(default, rename = "run-before", alias = "run_before")]
    pub run_before: Vec<RunCommand>,
    /// Whether this pane hosts the nested backend.
    #[serde(default)]
    pub nested: bool,
    /// Child panes opened inside the nested backend.
    #[serde(default)]
    pub panes: Option<PaneMap<PaneEntry>>,
}

/// Project section of a schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectConfig {
    /// Project name, shown by `conjure list`.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Base directory every pane directory is joined onto.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Top-level panes in declaration order.
    pub setup: PaneMap<RootPaneEntry>,
}

/// Terminal backends conjure can emit scripts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// kitty terminal, driven through session files.
    Kitty,
    /// tmux, driven through a generated shell script.
    Tmux,
}

impl BackendType {
    /// Lowercase backend name, also used as its data sub-folder.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Kitty => "kitty",
            BackendType::Tmux => "tmux",
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend type plus backend-specific options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendConfig {
    /// Which backend.
    pub name: BackendType,
    /// Options decoded by the backend plugin.
    #[serde(default)]
    pub options: serde_yaml::Mapping,
}

/// Backend field that accepts either a bare type or a full config.
///
/// ```yaml
/// backend: kitty
/// # or
/// backend: { name: tmux, options: { start_count_at_one: true } }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BackendSpec {
    /// Backend with default options.
    Bare(BackendType),
    /// Backend with explicit options.
    Configured(BackendConfig),
}

impl BackendSpec {
    /// Normalize both variants into a [`BackendConfig`].
    pub fn to_config(&self) -> BackendConfig {
        match self {
            BackendSpec::Bare(name) => BackendConfig {
                name: *name,
                options: serde_yaml::Mapping::new(),
            },
            BackendSpec::Configured(config) => config.clone(),
        }
    }
}

/// How panes are presented. Only tabs exist for now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardMode {
    /// One tab (or window) per pane.
    #[default]
    Tabbed,
}

/// Backend selection for one scope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaneConfig {
    /// Backend driving this scope.
    pub backend: BackendSpec,
    /// Pane presentation mode.
    #[serde(default)]
    pub mode: WizardMode,
}

/// Backend selection for the root scope and the optional nested scope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RootPaneConfig {
    /// Backend driving the root scope.
    pub backend: BackendSpec,
    /// Pane presentation mode.
    #[serde(default)]
    pub mode: WizardMode,
    /// Backend used inside root panes with `nested: true`.
    #[serde(default)]
    pub nested: Option<PaneConfig>,
}

/// Wizard section of a schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WizardConfig {
    /// Root scope backends.
    pub root: RootPaneConfig,
}

/// A parsed workspace schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Workspace {
    /// Backend selection.
    pub wizard: WizardConfig,
    /// Panes and commands.
    pub project: ProjectConfig,
}

impl Workspace {
    /// Parse and check a schema from a YAML string.
    ///
    /// # Errors
    ///
    /// - [`ConjureError::SchemaParse`] if the YAML is malformed or doesn't
    ///   match the expected structure
    /// - [`ConjureError::InvalidSchema`] if the project name is empty or no
    ///   pane is declared
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let workspace: Workspace = serde_yaml::from_str(yaml)?;

        if workspace.project.name.trim().is_empty() {
            return Err(ConjureError::InvalidSchema("project name is empty".into()));
        }
        if workspace.project.setup.is_empty() {
            return Err(ConjureError::InvalidSchema(
                "project.setup must declare at least one pane".into(),
            ));
        }

        Ok(workspace)
    }

    /// Whether any top-level pane asks for the nested backend.
    pub fn has_nested_panes(&self) -> bool {
        self.project.setup.iter().any(|(_, pane)| pane.nested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
wizard:
  root:
    backend: kitty
    nested:
      backend: { name: tmux, options: { start_count_at_one: true } }
project:
  name: demo
  dir: /srv/demo
  setup:
    zeta:
      run: ["echo z"]
    alpha:
      nested: true
      run:
        - macro: python-activate-venv
          options: { shell: fish }
      panes:
        second: { run: [["ls", "-la"]] }
        first:
          run-before: ["export A=1"]
"#;

    #[test]
    fn test_parse_keeps_declaration_order() {
        let ws = Workspace::from_yaml(SCHEMA).unwrap();
        let names: Vec<_> = ws.project.setup.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        let children = ws.project.setup.get("alpha").unwrap().panes.as_ref().unwrap();
        let child_names: Vec<_> = children.iter().map(|(n, _)| n).collect();
        assert_eq!(child_names, vec!["second", "first"]);
    }

    #[test]
    fn test_parse_run_command_variants() {
        let ws = Workspace::from_yaml(SCHEMA).unwrap();
        let alpha = ws.project.setup.get("alpha").unwrap();
        match &alpha.run[0] {
            RunCommand::Macro(m) => {
                assert_eq!(m.name, "python-activate-venv");
                assert_eq!(m.options.len(), 1);
            }
            other => panic!("expected macro, got {:?}", other),
        }

        let children = alpha.panes.as_ref().unwrap();
        assert_eq!(
            children.get("second").unwrap().run,
            vec![RunCommand::Tokens(vec!["ls".into(), "-la".into()])]
        );
        assert_eq!(
            children.get("first").unwrap().run_before,
            vec![RunCommand::Line("export A=1".into())]
        );
    }

    #[test]
    fn test_backend_spec_forms() {
        let ws = Workspace::from_yaml(SCHEMA).unwrap();
        let root = ws.wizard.root.backend.to_config();
        assert_eq!(root.name, BackendType::Kitty);
        assert!(root.options.is_empty());

        let nested = ws.wizard.root.nested.unwrap().backend.to_config();
        assert_eq!(nested.name, BackendType::Tmux);
        assert_eq!(nested.options.len(), 1);
    }

    #[test]
    fn test_has_nested_panes() {
        let ws = Workspace::from_yaml(SCHEMA).unwrap();
        assert!(ws.has_nested_panes());
    }

    #[test]
    fn test_duplicate_pane_names_rejected() {
        let yaml = r#"
wizard: { root: { backend: kitty } }
project:
  name: dup
  setup:
    a: { run: [] }
    a: { run: [] }
"#;
        assert!(Workspace::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_setup_rejected() {
        let yaml = r#"
wizard: { root: { backend: kitty } }
project:
  name: nothing
  setup: {}
"#;
        let err = Workspace::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConjureError::InvalidSchema(_)));
    }
}
