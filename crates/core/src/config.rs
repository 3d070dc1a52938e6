use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Upper bound on waiting for the store lock, both when opening and per write.
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    /// Verification token shared with the slash command configuration.
    pub token: SecretString,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen_address: String,
    pub health_check_port: Option<u16>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub slack_token: Option<String>,
    pub listen_address: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://icecream.db".to_string(),
                max_connections: 5,
                timeout_secs: 3,
            },
            slack: SlackConfig { token: String::new().into() },
            server: ServerConfig { listen_address: ":9000".to_string(), health_check_port: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ServerConfig {
    /// Webhook bind address as `host:port`. A bare `:port` binds every interface;
    /// hostnames are resolved when the listener binds.
    pub fn listen_bind_address(&self) -> Result<String, ConfigError> {
        let (host, port) = split_listen_address(&self.listen_address)?;
        Ok(format!("{host}:{port}"))
    }

    pub fn health_bind_address(&self) -> Result<Option<String>, ConfigError> {
        let Some(port) = self.health_check_port else {
            return Ok(None);
        };
        let (host, _) = split_listen_address(&self.listen_address)?;
        Ok(Some(format!("{host}:{port}")))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("icecream.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(slack) = patch.slack {
            if let Some(token) = slack.token {
                self.slack.token = secret_value(token);
            }
        }

        if let Some(server) = patch.server {
            if let Some(listen_address) = server.listen_address {
                self.server.listen_address = listen_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = Some(health_check_port);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ICECREAM_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ICECREAM_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("ICECREAM_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ICECREAM_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ICECREAM_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ICECREAM_SLACK_TOKEN") {
            self.slack.token = secret_value(value);
        }

        if let Some(value) = read_env("ICECREAM_SERVER_LISTEN_ADDRESS") {
            self.server.listen_address = value;
        }
        if let Some(value) = read_env("ICECREAM_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                Some(parse_u16("ICECREAM_SERVER_HEALTH_CHECK_PORT", &value)?);
        }

        let log_level =
            read_env("ICECREAM_LOGGING_LEVEL").or_else(|| read_env("ICECREAM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ICECREAM_LOGGING_FORMAT").or_else(|| read_env("ICECREAM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(slack_token) = overrides.slack_token {
            self.slack.token = secret_value(slack_token);
        }
        if let Some(listen_address) = overrides.listen_address {
            self.server.listen_address = listen_address;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_slack(&self.slack)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Builds a sqlite URL for a plain database file path.
///
/// sqlx percent-decodes the path part and treats `?` as the start of the
/// connection parameters, so those characters are escaped.
pub fn sqlite_url_for_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut url = String::with_capacity("sqlite://".len() + raw.len());
    url.push_str("sqlite://");
    for ch in raw.chars() {
        match ch {
            '%' => url.push_str("%25"),
            '?' => url.push_str("%3F"),
            '#' => url.push_str("%23"),
            other => url.push(other),
        }
    }
    url
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("icecream.toml"), PathBuf::from("config/icecream.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn split_listen_address(raw: &str) -> Result<(String, u16), ConfigError> {
    let invalid = || {
        ConfigError::Validation(format!(
            "server.listen_address `{raw}` must be `host:port` or `:port`"
        ))
    };

    let (host, port) = raw.trim().rsplit_once(':').ok_or_else(invalid)?;
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    if host.contains(char::is_whitespace) {
        return Err(invalid());
    }
    // IPv6 literals must be bracketed so the port separator is unambiguous.
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return Err(invalid());
    }

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok((host.to_string(), port))
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    if slack.token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "slack.token must be set. Copy the verification token from your slash command settings at https://api.slack.com/apps".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    server.listen_bind_address()?;

    if server.health_check_port == Some(0) {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    slack: Option<SlackPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    listen_address: Option<String>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        sqlite_url_for_path, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat,
    };

    const MANAGED_VARS: &[&str] = &[
        "ICECREAM_DATABASE_URL",
        "ICECREAM_DATABASE_MAX_CONNECTIONS",
        "ICECREAM_DATABASE_TIMEOUT_SECS",
        "ICECREAM_SLACK_TOKEN",
        "ICECREAM_SERVER_LISTEN_ADDRESS",
        "ICECREAM_SERVER_HEALTH_CHECK_PORT",
        "ICECREAM_LOGGING_LEVEL",
        "ICECREAM_LOG_LEVEL",
        "ICECREAM_LOGGING_FORMAT",
        "ICECREAM_LOG_FORMAT",
    ];

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        env::set_var("TEST_ICECREAM_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("icecream.toml");
            fs::write(
                &path,
                r#"
[slack]
token = "${TEST_ICECREAM_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.slack.token.expose_secret() == "token-from-env",
                "token should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_ICECREAM_TOKEN"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        env::set_var("ICECREAM_SLACK_TOKEN", "secret");
        env::set_var("ICECREAM_LOG_LEVEL", "warn");
        env::set_var("ICECREAM_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        env::set_var("ICECREAM_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("ICECREAM_SLACK_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("icecream.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"
timeout_secs = 10

[slack]
token = "token-from-file"

[server]
listen_address = "127.0.0.1:9100"
health_check_port = 9101

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.database.timeout_secs == 10, "file timeout should replace default")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.slack.token.expose_secret() == "token-from-env",
                "env token should win over file and defaults",
            )?;
            ensure(
                config.server.listen_address == "127.0.0.1:9100",
                "file listen address should replace default",
            )?;
            ensure(
                config.server.health_check_port == Some(9101),
                "file health port should be applied",
            )
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_without_token() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => {
                return Err("expected validation failure but config load succeeded".to_string())
            }
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("slack.token")
        );
        ensure(has_message, "validation failure should mention slack.token")
    }

    #[test]
    fn invalid_env_override_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        env::set_var("ICECREAM_SLACK_TOKEN", "secret");
        env::set_var("ICECREAM_DATABASE_TIMEOUT_SECS", "soon");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override to fail".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "ICECREAM_DATABASE_TIMEOUT_SECS", "error should name the variable")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn required_config_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            overrides: ConfigOverrides {
                slack_token: Some("secret".to_string()),
                ..ConfigOverrides::default()
            },
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should fail",
        )
    }

    #[test]
    fn listen_address_accepts_bare_port() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                slack_token: Some("secret".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.server.listen_bind_address().ok().as_deref() == Some("0.0.0.0:9000"),
            "`:9000` should bind all interfaces",
        )?;
        ensure(
            matches!(config.server.health_bind_address(), Ok(None)),
            "health listener is disabled by default",
        )?;

        let mut with_health = config.server.clone();
        with_health.health_check_port = Some(9001);
        ensure(
            with_health.health_bind_address().ok().flatten().as_deref() == Some("0.0.0.0:9001"),
            "health listener shares the webhook host",
        )
    }

    #[test]
    fn listen_address_accepts_hostnames_and_bracketed_ipv6() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                slack_token: Some("secret".to_string()),
                listen_address: Some("localhost:9000".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.server.listen_bind_address().ok().as_deref() == Some("localhost:9000"),
            "hostname should be kept for the listener to resolve",
        )?;

        let mut server = config.server.clone();
        server.listen_address = "[::1]:9100".to_string();
        server.health_check_port = Some(9101);
        ensure(
            server.listen_bind_address().ok().as_deref() == Some("[::1]:9100"),
            "bracketed IPv6 literal should be accepted",
        )?;
        ensure(
            server.health_bind_address().ok().flatten().as_deref() == Some("[::1]:9101"),
            "health listener reuses the IPv6 host",
        )?;

        server.listen_address = "::1:9100".to_string();
        ensure(server.listen_bind_address().is_err(), "unbracketed IPv6 should be rejected")
    }

    #[test]
    fn malformed_listen_address_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                slack_token: Some("secret".to_string()),
                listen_address: Some("localhost".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("listen_address")),
            "listen address without port should fail validation",
        )?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                slack_token: Some("secret".to_string()),
                listen_address: Some("localhost:http".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::Validation(_))),
            "non-numeric port should fail validation",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        env::set_var("ICECREAM_SLACK_TOKEN", "very-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("very-secret-value"), "debug output should not contain token")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn db_path_converts_to_sqlite_url() {
        assert_eq!(sqlite_url_for_path(Path::new("icecream.db")), "sqlite://icecream.db");
        assert_eq!(sqlite_url_for_path(Path::new("/var/lib/ice.db")), "sqlite:///var/lib/ice.db");
    }

    #[test]
    fn db_path_escapes_url_metacharacters() {
        assert_eq!(
            sqlite_url_for_path(Path::new("/srv/team%41?mode=ro#1.db")),
            "sqlite:///srv/team%2541%3Fmode=ro%231.db"
        );
    }
}
