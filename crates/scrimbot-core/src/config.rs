// Configuration loading and parsing (scrimbot.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::Team;

/// Shortest polling interval the scheduling service tolerates without
/// rate-limiting us.
pub const MIN_INTERVAL_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub team: TeamConfig,
    pub polling: PollingConfig,
    pub gankster: GanksterConfig,
    pub discord: DiscordConfig,
    pub sheet: SheetConfig,
    pub poll: PollConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// scrimbot.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire scrimbot.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ScrimbotFile {
    team: TeamConfig,
    polling: PollingConfig,
    gankster: GanksterConfig,
    discord: DiscordConfig,
    #[serde(default)]
    sheet: SheetConfig,
    #[serde(default)]
    poll: PollConfig,
}

/// The team whose scrims are tracked.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub name: String,
}

impl TeamConfig {
    pub fn to_team(&self) -> Team {
        Team::new(self.number, self.name.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GanksterConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub api_base: String,
    pub channel_id: String,
    /// Operator-facing channel for failures from the automatic tick path.
    #[serde(default)]
    pub error_channel_id: Option<String>,
    /// Role mentioned on booking and cancellation posts.
    #[serde(default)]
    pub ping_role_id: Option<String>,
    /// Prefix for opponent team links; the team number is appended.
    #[serde(default)]
    pub team_page_base: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SheetConfig {
    /// Apps Script endpoint. Sheet updates are skipped when absent.
    #[serde(default)]
    pub script_url: Option<String>,
    /// SQLite ledger file; `":memory:"` keeps it in memory.
    #[serde(default)]
    pub ledger_path: Option<String>,
}

/// Weekly availability poll.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Local hour on Saturday at or after which the poll is posted.
    #[serde(default = "default_poll_hour")]
    pub hour: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hour: default_poll_hour(),
        }
    }
}

fn default_poll_hour() -> u32 {
    6
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub gankster_bearer: Option<String>,
    pub discord_bot_token: Option<String>,
    pub google_bearer: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/scrimbot.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- scrimbot.toml (required) ---
    let main_path = config_dir.join("scrimbot.toml");
    let main_text = read_file(&main_path)?;
    let file: ScrimbotFile = toml::from_str(&main_text).map_err(|e| ConfigError::ParseError {
        path: main_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        team: file.team,
        polling: file.polling,
        gankster: file.gankster,
        discord: file.discord,
        sheet: file.sheet,
        poll: file.poll,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` from `defaults/`: every regular file not already present
/// is copied, `.example` files are skipped. Returns the copied paths.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    match (defaults_dir.is_dir(), config_dir.is_dir()) {
        (false, true) => return Ok(Vec::new()),
        (false, false) => {
            return Err(seed_error("find defaults/ or config/ in", base_dir, "not found"))
        }
        (true, _) => {}
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| seed_error("create", &config_dir, e))?;
    let entries =
        std::fs::read_dir(&defaults_dir).map_err(|e| seed_error("list", &defaults_dir, e))?;

    let mut copied = Vec::new();
    for entry in entries {
        let source = entry.map_err(|e| seed_error("list", &defaults_dir, e))?.path();
        let Some(name) = source.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !source.is_file() || name.ends_with(".example") {
            continue;
        }

        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&source, &target).map_err(|e| seed_error("copy", &source, e))?;
        copied.push(target);
    }

    Ok(copied)
}

fn seed_error(action: &str, path: &Path, cause: impl std::fmt::Display) -> ConfigError {
    ConfigError::DefaultsCopyError {
        message: format!("{action} {}: {cause}", path.display()),
    }
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if !config.team.to_team().is_known() {
        return Err(invalid("team", "number or name must be set"));
    }

    let interval = config.polling.interval_secs;
    if interval < MIN_INTERVAL_SECS {
        return Err(invalid(
            "polling.interval_secs",
            format!("must be at least {MIN_INTERVAL_SECS}, got {interval}"),
        ));
    }

    if config.gankster.base_url.trim().is_empty() {
        return Err(invalid("gankster.base_url", "must not be empty"));
    }
    if config.gankster.timeout_secs == 0 {
        return Err(invalid("gankster.timeout_secs", "must be greater than 0"));
    }

    if config.discord.channel_id.trim().is_empty() {
        return Err(invalid("discord.channel_id", "must not be empty"));
    }
    if config.discord.api_base.trim().is_empty() {
        return Err(invalid("discord.api_base", "must not be empty"));
    }

    if config.poll.hour > 23 {
        return Err(invalid(
            "poll.hour",
            format!("must be between 0 and 23, got {}", config.poll.hour),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID: &str = r#"
[team]
number = 84830
name = "Cryobark"

[polling]
interval_secs = 60

[gankster]
base_url = "https://api.gankster.gg/"
timeout_secs = 15

[discord]
api_base = "https://discord.com/api/v10"
channel_id = "1234"
ping_role_id = "987"
team_page_base = "https://gankster.gg/team/"

[sheet]
ledger_path = ":memory:"
"#;

    /// Fresh temp dir with a `config/` subdirectory; removes leftovers from a
    /// previous run.
    fn fixture(name: &str) -> (PathBuf, PathBuf) {
        let tmp = std::env::temp_dir().join(format!("scrimbot_config_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        let config_dir = tmp.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        (tmp, config_dir)
    }

    fn expect_validation(base: &Path, expected_field: &str) {
        match load_config_from(base).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config() {
        let (tmp, config_dir) = fixture("valid");
        fs::write(config_dir.join("scrimbot.toml"), VALID).unwrap();

        let config = load_config_from(&tmp).expect("should load valid config");
        assert_eq!(config.team.number, 84830);
        assert_eq!(config.team.name, "Cryobark");
        assert_eq!(config.polling.interval_secs, 60);
        assert_eq!(config.gankster.timeout_secs, 15);
        assert_eq!(config.discord.channel_id, "1234");
        assert_eq!(config.discord.ping_role_id.as_deref(), Some("987"));
        assert!(config.discord.error_channel_id.is_none());
        assert!(config.sheet.script_url.is_none());
        assert_eq!(config.sheet.ledger_path.as_deref(), Some(":memory:"));
        assert!(!config.poll.enabled);
        assert_eq!(config.poll.hour, 6);
        assert!(config.credentials.gankster_bearer.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_toml_is_read() {
        let (tmp, config_dir) = fixture("creds");
        fs::write(config_dir.join("scrimbot.toml"), VALID).unwrap();
        fs::write(
            config_dir.join("credentials.toml"),
            "gankster_bearer = \"abc\"\ndiscord_bot_token = \"tok\"\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.credentials.gankster_bearer.as_deref(), Some("abc"));
        assert_eq!(config.credentials.discord_bot_token.as_deref(), Some("tok"));
        assert!(config.credentials.google_bearer.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_main_file_is_file_not_found() {
        let (tmp, _) = fixture("missing");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("scrimbot.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let (tmp, config_dir) = fixture("malformed");
        fs::write(config_dir.join("scrimbot.toml"), "[team\nnumber = ").unwrap();
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_team() {
        let (tmp, config_dir) = fixture("no_team");
        let text = VALID
            .replace("number = 84830", "number = 0")
            .replace("name = \"Cryobark\"", "name = \"\"");
        fs::write(config_dir.join("scrimbot.toml"), text).unwrap();
        expect_validation(&tmp, "team");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_short_interval() {
        let (tmp, config_dir) = fixture("short_interval");
        let text = VALID.replace("interval_secs = 60", "interval_secs = 5");
        fs::write(config_dir.join("scrimbot.toml"), text).unwrap();
        expect_validation(&tmp, "polling.interval_secs");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_timeout() {
        let (tmp, config_dir) = fixture("zero_timeout");
        let text = VALID.replace("timeout_secs = 15", "timeout_secs = 0");
        fs::write(config_dir.join("scrimbot.toml"), text).unwrap();
        expect_validation(&tmp, "gankster.timeout_secs");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_channel() {
        let (tmp, config_dir) = fixture("empty_channel");
        let text = VALID.replace("channel_id = \"1234\"", "channel_id = \"\"");
        fs::write(config_dir.join("scrimbot.toml"), text).unwrap();
        expect_validation(&tmp, "discord.channel_id");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_poll_hour_out_of_range() {
        let (tmp, config_dir) = fixture("poll_hour");
        let text = format!("{VALID}\n[poll]\nenabled = true\nhour = 24\n");
        fs::write(config_dir.join("scrimbot.toml"), text).unwrap();
        expect_validation(&tmp, "poll.hour");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_examples() {
        let tmp = std::env::temp_dir().join("scrimbot_config_defaults_copy");
        let _ = fs::remove_dir_all(&tmp);
        let defaults = tmp.join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join("scrimbot.toml"), VALID).unwrap();
        fs::write(defaults.join("credentials.toml.example"), "gankster_bearer = \"\"").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config").join("scrimbot.toml")]);
        assert!(!tmp.join("config").join("credentials.toml.example").exists());

        // A second call leaves the existing copy alone.
        fs::write(tmp.join("config").join("scrimbot.toml"), "edited").unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(tmp.join("config").join("scrimbot.toml")).unwrap(),
            "edited"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_any_dir_errors() {
        let tmp = std::env::temp_dir().join("scrimbot_config_no_dirs");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = ensure_config_files(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        assert!(err.to_string().contains("scrimbot_config_no_dirs"), "{err}");
        let _ = fs::remove_dir_all(&tmp);
    }
}
