//! Configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--trash-dir`, `--log-file`, positional path)
//! 2. Explicit `--config` file
//! 3. `$FINDER_CONFIG` environment variable (path to config file)
//! 4. Project-local `.finder.toml` in the current working directory
//! 5. Global `~/.config/finder/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, TreeError};

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Starting directory (overridden by CLI positional arg).
    pub default_path: Option<String>,
    /// Confirm before trash/delete/restore.
    pub confirm_delete: Option<bool>,
}

/// Tree rendering and behaviour settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Indentation repeated once per depth level.
    pub indent: Option<String>,
    pub opened_marker: Option<String>,
    pub closed_marker: Option<String>,
    pub file_marker: Option<String>,
    pub selected_marker: Option<String>,
    /// Appended to directory names.
    pub dir_suffix: Option<String>,
    /// Where soft-deleted entries go. A leading `~` expands to the home directory.
    pub trash_dir: Option<String>,
    /// Regex matched against child names to detect a project root.
    pub project_pattern: Option<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Log file path. Logging is disabled when unset.
    pub file: Option<String>,
    /// Default filter directive, overridden by `$FINDER_LOG`.
    pub level: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub log: LogConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_INDENT: &str = " ";
pub const DEFAULT_OPENED_MARKER: &str = "-";
pub const DEFAULT_CLOSED_MARKER: &str = "+";
pub const DEFAULT_FILE_MARKER: &str = "|";
pub const DEFAULT_SELECTED_MARKER: &str = "*";
pub const DEFAULT_DIR_SUFFIX: &str = "/";
/// Trash directory name, relative to the home directory.
pub const DEFAULT_TRASH_DIR_NAME: &str = ".finder-trash";
pub const DEFAULT_PROJECT_PATTERN: &str = r"^(?:\.git)$";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Resolved settings ────────────────────────────────────────────────────────

/// Settings the tree core runs with, resolved once from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct TreeSettings {
    pub indent: String,
    pub opened_marker: String,
    pub closed_marker: String,
    pub file_marker: String,
    pub selected_marker: String,
    pub dir_suffix: String,
    pub trash_dir: PathBuf,
    pub project_pattern: Regex,
}

impl TreeSettings {
    /// Built-in defaults with the given trash directory.
    pub fn with_trash_dir(trash_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            indent: DEFAULT_INDENT.to_string(),
            opened_marker: DEFAULT_OPENED_MARKER.to_string(),
            closed_marker: DEFAULT_CLOSED_MARKER.to_string(),
            file_marker: DEFAULT_FILE_MARKER.to_string(),
            selected_marker: DEFAULT_SELECTED_MARKER.to_string(),
            dir_suffix: DEFAULT_DIR_SUFFIX.to_string(),
            trash_dir: trash_dir.into(),
            project_pattern: compile_project_pattern(DEFAULT_PROJECT_PATTERN)?,
        })
    }
}

fn compile_project_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| TreeError::Config(format!("invalid project_pattern {pattern:?}: {e}")))
}

/// Expand a leading `~` to the home directory.
fn expand_home(raw: &str) -> Result<PathBuf> {
    let Some(rest) = raw.strip_prefix('~') else {
        return Ok(PathBuf::from(raw));
    };
    let home = dirs::home_dir()
        .ok_or_else(|| TreeError::Config("cannot resolve home directory".to_string()))?;
    Ok(home.join(rest.trim_start_matches(['/', '\\'])))
}

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; `load` layers that separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("FINDER_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".finder.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("finder").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: other
                    .general
                    .default_path
                    .clone()
                    .or(self.general.default_path),
                confirm_delete: other.general.confirm_delete.or(self.general.confirm_delete),
            },
            tree: TreeConfig {
                indent: other.tree.indent.clone().or(self.tree.indent),
                opened_marker: other.tree.opened_marker.clone().or(self.tree.opened_marker),
                closed_marker: other.tree.closed_marker.clone().or(self.tree.closed_marker),
                file_marker: other.tree.file_marker.clone().or(self.tree.file_marker),
                selected_marker: other
                    .tree
                    .selected_marker
                    .clone()
                    .or(self.tree.selected_marker),
                dir_suffix: other.tree.dir_suffix.clone().or(self.tree.dir_suffix),
                trash_dir: other.tree.trash_dir.clone().or(self.tree.trash_dir),
                project_pattern: other
                    .tree
                    .project_pattern
                    .clone()
                    .or(self.tree.project_pattern),
            },
            log: LogConfig {
                file: other.log.file.clone().or(self.log.file),
                level: other.log.level.clone().or(self.log.level),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher overwrites.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    /// Resolve the tree settings, compiling the project pattern and
    /// expanding the trash directory.
    pub fn settings(&self) -> Result<TreeSettings> {
        let tree = &self.tree;
        Ok(TreeSettings {
            indent: tree.indent.clone().unwrap_or_else(|| DEFAULT_INDENT.into()),
            opened_marker: tree
                .opened_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENED_MARKER.into()),
            closed_marker: tree
                .closed_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_CLOSED_MARKER.into()),
            file_marker: tree
                .file_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_FILE_MARKER.into()),
            selected_marker: tree
                .selected_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_SELECTED_MARKER.into()),
            dir_suffix: tree
                .dir_suffix
                .clone()
                .unwrap_or_else(|| DEFAULT_DIR_SUFFIX.into()),
            trash_dir: self.trash_dir()?,
            project_pattern: compile_project_pattern(self.project_pattern())?,
        })
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether to confirm before trash/delete/restore.
    pub fn confirm_delete(&self) -> bool {
        self.general.confirm_delete.unwrap_or(true)
    }

    /// Trash directory, defaulting to `~/.finder-trash`.
    pub fn trash_dir(&self) -> Result<PathBuf> {
        match self.tree.trash_dir.as_deref() {
            Some(raw) => expand_home(raw),
            None => dirs::home_dir()
                .map(|home| home.join(DEFAULT_TRASH_DIR_NAME))
                .ok_or_else(|| TreeError::Config("cannot resolve home directory".to_string())),
        }
    }

    pub fn project_pattern(&self) -> &str {
        self.tree
            .project_pattern
            .as_deref()
            .unwrap_or(DEFAULT_PROJECT_PATTERN)
    }

    /// Log file, if logging is enabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_deref().map(PathBuf::from)
    }

    /// Default log filter directive.
    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert!(cfg.confirm_delete());
        assert_eq!(cfg.project_pattern(), r"^(?:\.git)$");
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.log_file().is_none());
        if let Some(home) = dirs::home_dir() {
            assert_eq!(cfg.trash_dir().unwrap(), home.join(".finder-trash"));
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = TreeSettings::with_trash_dir("/tmp/trash").unwrap();
        assert_eq!(settings.indent, " ");
        assert_eq!(settings.opened_marker, "-");
        assert_eq!(settings.closed_marker, "+");
        assert_eq!(settings.file_marker, "|");
        assert_eq!(settings.selected_marker, "*");
        assert_eq!(settings.dir_suffix, "/");
        assert!(settings.project_pattern.is_match(".git"));
        assert!(!settings.project_pattern.is_match(".github"));
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r##"
[general]
default_path = "/srv"
confirm_delete = false

[tree]
indent = "  "
opened_marker = "v"
closed_marker = ">"
file_marker = "."
selected_marker = "#"
dir_suffix = ""
trash_dir = "/var/tmp/trash"
project_pattern = "^Cargo\\.toml$"

[log]
file = "/tmp/finder.log"
level = "debug"
"##;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert!(!cfg.confirm_delete());
        assert_eq!(cfg.general.default_path.as_deref(), Some("/srv"));
        assert_eq!(cfg.log_file(), Some(PathBuf::from("/tmp/finder.log")));
        assert_eq!(cfg.log_level(), "debug");

        let settings = cfg.settings().unwrap();
        assert_eq!(settings.indent, "  ");
        assert_eq!(settings.opened_marker, "v");
        assert_eq!(settings.closed_marker, ">");
        assert_eq!(settings.file_marker, ".");
        assert_eq!(settings.selected_marker, "#");
        assert_eq!(settings.dir_suffix, "");
        assert_eq!(settings.trash_dir, PathBuf::from("/var/tmp/trash"));
        assert!(settings.project_pattern.is_match("Cargo.toml"));
    }

    #[test]
    fn test_toml_parsing_partial() {
        let toml = r#"
[tree]
indent = "    "
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        let settings = cfg.settings().unwrap();
        assert_eq!(settings.indent, "    ");
        assert_eq!(settings.opened_marker, "-");
        assert!(cfg.confirm_delete());
    }

    #[test]
    fn test_toml_parsing_empty() {
        let cfg: AppConfig = toml::from_str("").expect("parse failed");
        assert!(cfg.confirm_delete());
        assert_eq!(cfg.log_level(), "info");
    }

    #[test]
    fn test_invalid_project_pattern_is_config_error() {
        let cfg = AppConfig {
            tree: TreeConfig {
                project_pattern: Some("(unclosed".into()),
                trash_dir: Some("/tmp/trash".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(cfg.settings(), Err(TreeError::Config(_))));
    }

    #[test]
    fn test_trash_dir_expands_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let cfg = AppConfig {
            tree: TreeConfig {
                trash_dir: Some("~/somewhere/trash".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(cfg.trash_dir().unwrap(), home.join("somewhere").join("trash"));
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            general: GeneralConfig {
                confirm_delete: Some(false),
                ..Default::default()
            },
            tree: TreeConfig {
                indent: Some("  ".into()),
                file_marker: Some(".".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let over = AppConfig {
            tree: TreeConfig {
                indent: Some("\t".into()),
                // file_marker not set, should keep base
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(&over);
        assert_eq!(merged.tree.indent.as_deref(), Some("\t")); // overridden
        assert_eq!(merged.tree.file_marker.as_deref(), Some(".")); // from base
        assert!(!merged.confirm_delete()); // from base
    }

    #[test]
    fn test_merge_none_does_not_clear_some() {
        let base = AppConfig {
            log: LogConfig {
                file: Some("/tmp/a.log".into()),
                level: Some("trace".into()),
            },
            ..Default::default()
        };
        let merged = base.merge(&AppConfig::default());
        assert_eq!(merged.log_file(), Some(PathBuf::from("/tmp/a.log")));
        assert_eq!(merged.log_level(), "trace");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[tree]
closed_marker = ">"

[log]
level = "warn"
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert_eq!(cfg.tree.closed_marker.as_deref(), Some(">"));
        assert_eq!(cfg.log_level(), "warn");
        assert!(cfg.confirm_delete());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_file(Path::new("/nonexistent/config.toml")).is_none());
    }

    #[test]
    fn test_load_invalid_toml_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[tree]
trash_dir = "/from/file"
opened_marker = "v"
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            tree: TreeConfig {
                trash_dir: Some("/from/cli".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        assert_eq!(cfg.trash_dir().unwrap(), PathBuf::from("/from/cli"));
        assert_eq!(cfg.tree.opened_marker.as_deref(), Some("v"));
    }
}
