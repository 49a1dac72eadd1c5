//! Shell configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use permission_core::{ServiceConfig, SubjectReference};

/// Configuration for one `permsh` session.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// Subject whose permissions gate commands; `None` runs as the console,
    /// which may do anything.
    pub source: Option<SubjectReference>,
    pub prompt: String,
    /// Snapshot loaded at startup and written by `export` without a path.
    pub snapshot_file: Option<PathBuf>,
    pub service: ServiceConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            source: None,
            prompt: "permsh> ".to_string(),
            snapshot_file: None,
            service: ServiceConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `PERMSH_SOURCE` - Subject to run commands as, `collection:identifier`
    /// - `PERMSH_PROMPT` - Prompt printed before each line (default: `permsh> `)
    /// - `PERMSH_SNAPSHOT` - Snapshot file to load and export to
    /// - `PERM_*` - Resolution settings, see [`ServiceConfig::from_env`]
    pub fn from_env() -> Self {
        let mut config = Self {
            service: ServiceConfig::from_env(),
            ..Self::default()
        };

        config.source = read_env::<SubjectReference>("PERMSH_SOURCE");

        if let Ok(prompt) = env::var("PERMSH_PROMPT") {
            config.prompt = prompt;
        }

        config.snapshot_file = env::var("PERMSH_SNAPSHOT").ok().map(PathBuf::from);

        config
    }
}

/// Platform data location for the snapshot file.
///
/// - Linux: `~/.local/share/permsh/subjects.json`
/// - macOS: `~/Library/Application Support/permsh/subjects.json`
/// - Windows: `%APPDATA%\permsh\subjects.json`
pub fn default_snapshot_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "permsh")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./permsh_data"))
        .join("subjects.json")
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
