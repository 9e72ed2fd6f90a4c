use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "TreeMaterializer";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "treematerializer", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the configuration from `path`, or from the platform config file.
/// If the file doesn't exist, it creates a default one.
/// If the file cannot be parsed, it tries a legacy migration, then logs a
/// warning and falls back to the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_path = resolve_path(path)?;

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config(&default_config, Some(config_path.as_path()))?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file {:?}", config_path))?;

    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Trying legacy format.",
                config_path,
                e
            );
            migrate_legacy_config(&config_content).or_else(|e| {
                tracing::warn!("Legacy migration failed: {}. Falling back to default config.", e);
                Ok(AppConfig::default())
            })
        }
    }
}

/// Migrates older configuration files to the current `AppConfig` layout.
///
/// Older files carried only a flat `exclude` (or `ignore_patterns`) list of
/// names; every other field is filled from the defaults.
fn migrate_legacy_config(config_content: &str) -> Result<AppConfig> {
    let mut value: Value = serde_json::from_str(config_content)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Config is not a JSON object"))?;

    let defaults = AppConfig::default();

    for legacy_key in ["exclude", "ignore_patterns"] {
        if let Some(list) = obj.remove(legacy_key) {
            if !obj.contains_key("exclude_patterns") {
                obj.insert("exclude_patterns".to_string(), list);
            }
        }
    }
    if let Some(list) = obj.remove("include") {
        if !obj.contains_key("include_patterns") {
            obj.insert("include_patterns".to_string(), list);
        }
    }

    // Helper to insert a default value if the key is missing or its value is null.
    let ensure_field = |obj: &mut serde_json::Map<String, Value>, key: &str, default_val: Value| {
        if !obj.contains_key(key) || obj.get(key) == Some(&Value::Null) {
            obj.insert(key.to_string(), default_val);
        }
    };

    ensure_field(
        obj,
        "include_patterns",
        serde_json::to_value(&defaults.include_patterns)?,
    );
    ensure_field(
        obj,
        "exclude_patterns",
        serde_json::to_value(&defaults.exclude_patterns)?,
    );
    if !obj.contains_key("marker") {
        obj.insert("marker".to_string(), serde_json::to_value(&defaults.marker)?);
    }
    ensure_field(
        obj,
        "nested_order",
        serde_json::to_value(defaults.nested_order)?,
    );
    ensure_field(
        obj,
        "default_order",
        serde_json::to_value(defaults.default_order)?,
    );
    ensure_field(obj, "root_directory", Value::Null);
    ensure_field(
        obj,
        "output_file",
        serde_json::to_value(&defaults.output_file)?,
    );
    ensure_field(obj, "pretty_json", Value::Bool(defaults.pretty_json));

    let migrated_config: AppConfig = serde_json::from_value(Value::Object(obj.clone()))?;
    tracing::info!("Successfully migrated legacy config");
    Ok(migrated_config)
}

/// Saves the provided configuration to `path`, or to the platform config file.
pub fn save_config(config: &AppConfig, path: Option<&Path>) -> Result<()> {
    let config_path = resolve_path(path)?;

    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)
        .with_context(|| format!("Failed to write config file {:?}", config_path))?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

/// Exports the configuration to a user-chosen JSON file.
///
/// Unlike [`save_config`], the destination's directory must already exist.
pub fn export_config(config: &AppConfig, export_path: &Path) -> Result<()> {
    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(export_path, config_json)
        .with_context(|| format!("Failed to export config to {:?}", export_path))?;
    tracing::info!("Exported config to {:?}", export_path);
    Ok(())
}

/// Imports a configuration from a user-chosen JSON file, accepting the
/// legacy layout too. Unlike [`load_config`], a bad file is an error.
pub fn import_config(import_path: &Path) -> Result<AppConfig> {
    let config_content = fs::read_to_string(import_path)
        .with_context(|| format!("Failed to read config file {:?}", import_path))?;
    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Imported config from {:?}", import_path);
            Ok(config)
        }
        Err(_) => {
            tracing::info!("Importing legacy config format from {:?}", import_path);
            migrate_legacy_config(&config_content)
                .with_context(|| format!("Failed to import config from {:?}", import_path))
        }
    }
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.treematerializer.TreeMaterializer/
// Linux:   ~/.config/treematerializer/
// Windows: %APPDATA%/treematerializer/TreeMaterializer/config/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DefaultOrder, NestedOrder};
    use tempfile::tempdir;

    #[test]
    fn missing_file_creates_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub/config.json");

        let config = load_config(Some(path.as_path())).unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn saved_config_loads_back_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AppConfig {
            include_patterns: ["*.json".to_string()].into_iter().collect(),
            marker: None,
            nested_order: NestedOrder::Alphabetical,
            default_order: DefaultOrder::ModifiedAsc,
            root_directory: Some(PathBuf::from("/srv/public")),
            pretty_json: false,
            ..Default::default()
        };

        save_config(&config, Some(path.as_path())).unwrap();
        assert_eq!(load_config(Some(path.as_path())).unwrap(), config);
    }

    #[test]
    fn legacy_exclude_list_is_migrated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"exclude": [".git", "dist"]}"#).unwrap();

        let config = load_config(Some(path.as_path())).unwrap();

        assert_eq!(
            config.exclude_patterns,
            [".git", "dist"]
                .into_iter()
                .map(String::from)
                .collect::<std::collections::BTreeSet<_>>()
        );
        assert!(config.include_patterns.is_empty());
        assert_eq!(config.marker.as_deref(), Some("MENU"));
        assert_eq!(config.output_file, PathBuf::from("tree-data.json"));
    }

    #[test]
    fn legacy_null_marker_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"ignore_patterns": ["target"], "marker": null}"#).unwrap();

        let config = load_config(Some(path.as_path())).unwrap();

        assert_eq!(config.marker, None);
        assert!(config.exclude_patterns.contains("target"));
    }

    #[test]
    fn corrupt_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "this is { not json").unwrap();

        assert_eq!(load_config(Some(path.as_path())).unwrap(), AppConfig::default());
    }

    #[test]
    fn saved_patterns_are_sorted_and_stable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AppConfig {
            exclude_patterns: ["zeta", "alpha", "*.tmp", "Mid"]
                .into_iter()
                .map(String::from)
                .collect(),
            ..Default::default()
        };

        save_config(&config, Some(path.as_path())).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        save_config(&config, Some(path.as_path())).unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        let value: Value = serde_json::from_str(&first).unwrap();
        assert_eq!(
            value["exclude_patterns"],
            serde_json::json!(["*.tmp", "Mid", "alpha", "zeta"])
        );
    }

    #[test]
    fn exported_config_imports_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.json");
        let config = AppConfig {
            include_patterns: ["MENU/**".to_string()].into_iter().collect(),
            nested_order: NestedOrder::Alphabetical,
            ..Default::default()
        };

        export_config(&config, &path).unwrap();

        assert_eq!(import_config(&path).unwrap(), config);
    }

    #[test]
    fn import_accepts_legacy_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.json");
        fs::write(&path, r#"{"include": ["*.json"], "exclude": ["dist"]}"#).unwrap();

        let config = import_config(&path).unwrap();

        assert!(config.include_patterns.contains("*.json"));
        assert!(config.exclude_patterns.contains("dist"));
        assert_eq!(config.default_order, DefaultOrder::Name);
    }

    #[test]
    fn import_rejects_unreadable_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(import_config(&path).is_err());
        assert!(import_config(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn tree_options_mirror_config() {
        let config = AppConfig::default();
        let options = config.tree_options();
        assert!(options.exclude_patterns.contains("node_modules"));
        assert_eq!(options.marker.as_deref(), Some("MENU"));
        assert_eq!(options.sort_policy.nested, NestedOrder::ModifiedDesc);
        assert_eq!(options.sort_policy.default, DefaultOrder::Name);
    }
}
