//! Configuration management for `formsync`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`FORMSYNC_*`)
//! 3. Project config (`./formsync.yaml`, or the file given with `--config`)
//! 4. User config (`~/.config/formsync/config.yaml`)
//! 5. Defaults
//!
//! Every layer is a flat `key → string` map. Nested YAML mappings flatten to
//! dotted keys and sequences to newline-joined strings.

use crate::error::{FormsyncError, Result};
use crate::signature::{Canonicalizer, DEFAULT_LABEL_STRIP_PATTERNS};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project config filename looked up in the working directory.
pub const PROJECT_CONFIG_FILENAME: &str = "formsync.yaml";

/// Prefix of environment variables read as configuration.
const ENV_PREFIX: &str = "FORMSYNC_";

pub const DEFAULT_SOURCE_FORMS: &str = "source_forms_library.json";
pub const DEFAULT_TARGET_FORMS: &str = "target_forms_library.json";
pub const DEFAULT_SOURCE_QUESTIONS: &str = "source_questions_bank.json";
pub const DEFAULT_TARGET_QUESTIONS: &str = "target_questions_bank.json";
pub const DEFAULT_TARGET_WORKFLOW: &str = "target_workflow_config.json";
pub const DEFAULT_UPDATED_FORMS: &str = "Updated_target_forms_library.json";
pub const DEFAULT_UPDATED_QUESTIONS: &str = "Updated_target_questions_bank.json";
pub const DEFAULT_SOURCE_FIELDS: &str = "source_fields.json";
pub const DEFAULT_TARGET_FIELDS: &str = "target_fields.json";
pub const DEFAULT_TARGET_PROFILE: &str = "target_profile_display.json";

/// A flat configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `FORMSYNC_*` variables.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }

    fn insert(&mut self, key: &str, value: String) {
        self.values.insert(normalize_key(key), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Project config file replacing `./formsync.yaml`.
    pub config: Option<PathBuf>,
    pub source_forms: Option<PathBuf>,
    pub target_forms: Option<PathBuf>,
    pub source_questions: Option<PathBuf>,
    pub target_questions: Option<PathBuf>,
    pub target_workflow: Option<PathBuf>,
    pub updated_forms: Option<PathBuf>,
    pub updated_questions: Option<PathBuf>,
    pub source_fields: Option<PathBuf>,
    pub target_fields: Option<PathBuf>,
    pub target_profile: Option<PathBuf>,
    pub allow_missing: Option<bool>,
    pub strict_unresolved: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        let paths = [
            ("source_forms", &self.source_forms),
            ("target_forms", &self.target_forms),
            ("source_questions", &self.source_questions),
            ("target_questions", &self.target_questions),
            ("target_workflow", &self.target_workflow),
            ("updated_forms", &self.updated_forms),
            ("updated_questions", &self.updated_questions),
            ("source_fields", &self.source_fields),
            ("target_fields", &self.target_fields),
            ("target_profile", &self.target_profile),
        ];
        for (key, path) in paths {
            if let Some(path) = path {
                layer.insert(key, path.to_string_lossy().to_string());
            }
        }

        if let Some(allow_missing) = self.allow_missing {
            layer.insert("allow_missing", allow_missing.to_string());
        }
        if let Some(strict) = self.strict_unresolved {
            layer.insert("strict_unresolved", strict.to_string());
        }

        layer
    }
}

/// Load user config (`~/.config/formsync/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("formsync")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load project config from an explicit path or `./formsync.yaml`.
///
/// # Errors
///
/// Returns `FileNotFound` if an explicit path does not exist, or an error if
/// the file cannot be read or parsed.
pub fn load_project_config(explicit: Option<&Path>) -> Result<ConfigLayer> {
    match explicit {
        Some(path) if !path.exists() => Err(FormsyncError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Some(path) => ConfigLayer::from_yaml(path),
        None => ConfigLayer::from_yaml(Path::new(PROJECT_CONFIG_FILENAME)),
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let defaults = [
        ("source_forms", DEFAULT_SOURCE_FORMS),
        ("target_forms", DEFAULT_TARGET_FORMS),
        ("source_questions", DEFAULT_SOURCE_QUESTIONS),
        ("target_questions", DEFAULT_TARGET_QUESTIONS),
        ("target_workflow", DEFAULT_TARGET_WORKFLOW),
        ("updated_forms", DEFAULT_UPDATED_FORMS),
        ("updated_questions", DEFAULT_UPDATED_QUESTIONS),
        ("source_fields", DEFAULT_SOURCE_FIELDS),
        ("target_fields", DEFAULT_TARGET_FIELDS),
        ("target_profile", DEFAULT_TARGET_PROFILE),
        ("allow_missing", "false"),
        ("strict_unresolved", "false"),
    ];
    for (key, value) in defaults {
        layer.insert(key, value.to_string());
    }
    layer.insert("label_strip_patterns", DEFAULT_LABEL_STRIP_PATTERNS.join("\n"));
    layer
}

/// Load configuration with the full precedence chain.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(cli: &CliOverrides) -> Result<ConfigLayer> {
    let defaults = default_config_layer();
    let user = load_user_config()?;
    let project = load_project_config(cli.config.as_deref())?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    Ok(ConfigLayer::merge_layers(&[
        defaults, user, project, env_layer, cli_layer,
    ]))
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub source_forms: PathBuf,
    pub target_forms: PathBuf,
    pub source_questions: PathBuf,
    pub target_questions: PathBuf,
    pub target_workflow: PathBuf,
    pub updated_forms: PathBuf,
    pub updated_questions: PathBuf,
    pub source_fields: PathBuf,
    pub target_fields: PathBuf,
    pub target_profile: PathBuf,
    pub allow_missing: bool,
    pub strict_unresolved: bool,
    pub label_strip_patterns: Vec<String>,
}

impl RunConfig {
    /// Resolve a merged layer into typed settings.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::Config` for unparseable booleans or empty paths.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        Ok(Self {
            source_forms: path_value(layer, "source_forms", DEFAULT_SOURCE_FORMS)?,
            target_forms: path_value(layer, "target_forms", DEFAULT_TARGET_FORMS)?,
            source_questions: path_value(layer, "source_questions", DEFAULT_SOURCE_QUESTIONS)?,
            target_questions: path_value(layer, "target_questions", DEFAULT_TARGET_QUESTIONS)?,
            target_workflow: path_value(layer, "target_workflow", DEFAULT_TARGET_WORKFLOW)?,
            updated_forms: path_value(layer, "updated_forms", DEFAULT_UPDATED_FORMS)?,
            updated_questions: path_value(layer, "updated_questions", DEFAULT_UPDATED_QUESTIONS)?,
            source_fields: path_value(layer, "source_fields", DEFAULT_SOURCE_FIELDS)?,
            target_fields: path_value(layer, "target_fields", DEFAULT_TARGET_FIELDS)?,
            target_profile: path_value(layer, "target_profile", DEFAULT_TARGET_PROFILE)?,
            allow_missing: bool_value(layer, "allow_missing")?,
            strict_unresolved: bool_value(layer, "strict_unresolved")?,
            label_strip_patterns: layer
                .get("label_strip_patterns")
                .map(split_list)
                .unwrap_or_default(),
        })
    }

    /// Load and resolve configuration for one command.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be read or a value is invalid.
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let layer = load_config(cli)?;
        Self::from_layer(&layer)
    }

    /// Signature builder using the configured label patterns.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::Config` if a pattern is not a valid regex.
    pub fn canonicalizer(&self) -> Result<Canonicalizer> {
        Canonicalizer::new(&self.label_strip_patterns)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('-', "_")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn bool_value(layer: &ConfigLayer, key: &str) -> Result<bool> {
    match layer.get(key) {
        None => Ok(false),
        Some(raw) => parse_bool(raw).ok_or_else(|| {
            FormsyncError::Config(format!("invalid boolean for '{key}': {raw}"))
        }),
    }
}

fn path_value(layer: &ConfigLayer, key: &str, default: &str) -> Result<PathBuf> {
    let raw = layer.get(key).unwrap_or(default).trim();
    if raw.is_empty() {
        return Err(FormsyncError::Config(format!("empty path for '{key}'")));
    }
    Ok(PathBuf::from(raw))
}

/// Split a flattened list. Newlines separate entries so regexes may contain
/// commas.
fn split_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join("\n");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layer(entries: &[(&str, &str)]) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        for (key, value) in entries {
            layer.insert(key, (*value).to_string());
        }
        layer
    }

    #[test]
    fn merge_precedence_order() {
        let defaults = default_config_layer();
        let user = layer(&[("target_workflow", "user.json")]);
        let project = layer(&[("target_workflow", "project.json")]);
        let env_layer = layer(&[("target_workflow", "env.json")]);
        let cli = CliOverrides {
            target_workflow: Some(PathBuf::from("cli.json")),
            ..CliOverrides::default()
        }
        .as_layer();

        let merged = ConfigLayer::merge_layers(&[defaults.clone(), user.clone(), project.clone()]);
        assert_eq!(merged.get("target_workflow"), Some("project.json"));

        let merged = ConfigLayer::merge_layers(&[defaults, user, project, env_layer, cli]);
        assert_eq!(merged.get("target_workflow"), Some("cli.json"));
    }

    #[test]
    fn env_vars_are_prefixed_and_normalized() {
        let layer = ConfigLayer::from_env_vars([
            ("FORMSYNC_ALLOW_MISSING".to_string(), "yes".to_string()),
            ("FORMSYNC_TARGET-WORKFLOW".to_string(), "wf.json".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]);
        assert_eq!(layer.get("allow_missing"), Some("yes"));
        assert_eq!(layer.get("target-workflow"), Some("wf.json"));
        assert_eq!(layer.values.len(), 2);
    }

    #[test]
    fn yaml_sequence_flattens_to_lines() {
        let yaml = r#"
label_strip_patterns:
  - '\s+rel="[^"]*"'
  - 'x{1,3}'
paths:
  nested: value
"#;
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("parse yaml");
        let layer = layer_from_yaml_value(&value);
        assert_eq!(layer.get("paths.nested"), Some("value"));

        let config = RunConfig::from_layer(&layer).expect("run config");
        assert_eq!(
            config.label_strip_patterns,
            vec![r#"\s+rel="[^"]*""#.to_string(), "x{1,3}".to_string()]
        );
        assert!(config.canonicalizer().is_ok());
    }

    #[test]
    fn run_config_defaults() {
        let config = RunConfig::from_layer(&default_config_layer()).expect("run config");
        assert_eq!(config.source_forms, PathBuf::from(DEFAULT_SOURCE_FORMS));
        assert_eq!(config.updated_forms, PathBuf::from(DEFAULT_UPDATED_FORMS));
        assert!(!config.allow_missing);
        assert!(!config.strict_unresolved);
        assert_eq!(config.label_strip_patterns.len(), DEFAULT_LABEL_STRIP_PATTERNS.len());
    }

    #[test]
    fn run_config_rejects_bad_bool() {
        let layer = layer(&[("allow_missing", "sometimes")]);
        let err = RunConfig::from_layer(&layer).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid boolean for 'allow_missing': sometimes"
        );
    }

    #[test]
    fn run_config_rejects_bad_pattern() {
        let layer = layer(&[("label_strip_patterns", "(")]);
        let config = RunConfig::from_layer(&layer).expect("run config");
        assert!(matches!(config.canonicalizer(), Err(FormsyncError::Config(_))));
    }

    #[test]
    fn project_config_from_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("custom.yaml");
        fs::write(&path, "strict_unresolved: true\nupdated-forms: out/forms.json\n")
            .expect("write config");

        let layer = load_project_config(Some(&path)).expect("project config");
        let config = RunConfig::from_layer(&layer).expect("run config");
        assert!(config.strict_unresolved);
        assert_eq!(config.updated_forms, PathBuf::from("out/forms.json"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let temp = TempDir::new().expect("tempdir");
        let err = load_project_config(Some(&temp.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, FormsyncError::FileNotFound { .. }));
    }
}
