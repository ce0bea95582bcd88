use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{Result, TrackRepoError};

/// Default release registry API base URL.
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

/// Optional configuration file layer.
///
/// Every field is optional here; environment variables override whatever the
/// file provides, and required fields are validated after both layers merge.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FileConfig {
    #[serde(rename = "api-url")]
    pub api_url: Option<String>,

    #[serde(rename = "this-repo")]
    pub this_repo: Option<String>,

    #[serde(rename = "track-repo")]
    pub track_repo: Option<String>,

    #[serde(rename = "release-file")]
    pub release_file: Option<String>,

    #[serde(rename = "environment-variable")]
    pub environment_variable: Option<String>,

    #[serde(rename = "do-tag")]
    pub do_tag: Option<bool>,

    #[serde(rename = "do-release")]
    pub do_release: Option<bool>,

    #[serde(rename = "git-username")]
    pub git_username: Option<String>,

    #[serde(rename = "git-token")]
    pub git_token: Option<String>,
}

/// Resolved plugin configuration.
///
/// Built once at startup from the optional config file plus `PLUGIN_*`
/// environment variables; immutable afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the release registry API.
    pub api_url: String,

    /// Identifier of the repository running this step (e.g. "owner/name").
    pub this_repo: String,

    /// Identifier of the repository whose releases are tracked.
    pub track_repo: String,

    /// Path to write the resolved version to, when set.
    pub release_file: Option<String>,

    /// Environment variable name to export the resolved version as, when set.
    pub environment_variable: Option<String>,

    /// Create and push a git tag for the resolved version.
    pub do_tag: bool,

    /// Create a hosted release for the resolved version.
    pub do_release: bool,

    pub git_username: Option<String>,
    pub git_token: Option<String>,
}

impl Config {
    /// Loads configuration from file and environment.
    ///
    /// Lookup order for the file layer:
    /// 1. Custom path provided as parameter
    /// 2. `trackrepo.toml` in current directory
    /// 3. `.trackrepo.toml` in the user config directory
    /// 4. Empty layer if no file found
    ///
    /// `PLUGIN_*` environment variables override file values. The parent and
    /// tracked repository identifiers are required; a missing one yields a
    /// `Config` error naming the environment variable to set.
    pub fn load(config_path: Option<&str>) -> Result<Config> {
        let file = load_file_layer(config_path)?;

        let api_url = env_var("PLUGIN_API_URL")
            .or(file.api_url)
            .unwrap_or_else(default_api_url);

        let this_repo = env_var("PLUGIN_THIS_REPO").or(file.this_repo);
        let track_repo = env_var("PLUGIN_TRACK_REPO").or(file.track_repo);

        let mut missing = Vec::new();
        if this_repo.is_none() {
            missing.push(("parent repository", "PLUGIN_THIS_REPO"));
        }
        if track_repo.is_none() {
            missing.push(("tracked repository", "PLUGIN_TRACK_REPO"));
        }
        if let Some((name, var)) = missing.first() {
            return Err(TrackRepoError::config(format!(
                "Can not find required variable for {}. Set it using \"{}\" environment variable.",
                name, var
            )));
        }

        Ok(Config {
            api_url,
            this_repo: this_repo.unwrap_or_default(),
            track_repo: track_repo.unwrap_or_default(),
            release_file: env_var("PLUGIN_RELEASE_FILE").or(file.release_file),
            environment_variable: env_var("PLUGIN_ENVIRONMENT_VARIABLE")
                .or(file.environment_variable),
            do_tag: env_flag("PLUGIN_DO_TAG").or(file.do_tag).unwrap_or(false),
            do_release: env_flag("PLUGIN_DO_RELEASE")
                .or(file.do_release)
                .unwrap_or(false),
            git_username: env_var("PLUGIN_GIT_USERNAME").or(file.git_username),
            git_token: env_var("PLUGIN_GIT_TOKEN").or(file.git_token),
        })
    }

    /// True when both git username and token are configured.
    pub fn has_credentials(&self) -> bool {
        self.git_username.is_some() && self.git_token.is_some()
    }
}

fn load_file_layer(config_path: Option<&str>) -> Result<FileConfig> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./trackrepo.toml").exists() {
        fs::read_to_string("./trackrepo.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".trackrepo.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(FileConfig::default());
        }
    } else {
        return Ok(FileConfig::default());
    };

    let config: FileConfig = toml::from_str(&config_str)
        .map_err(|e| TrackRepoError::config(format!("Invalid configuration file: {}", e)))?;
    Ok(config)
}

/// Reads an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

/// Parses a boolean toggle from the environment.
///
/// Accepts "true", "1" and "yes" (case-insensitive) as enabled.
fn env_flag(name: &str) -> Option<bool> {
    env_var(name).map(|value| {
        matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        )
    })
}
