use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// SQL dialect spoken by the configured database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Infer the dialect from a connection URL scheme
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "sqlite" => Some(Dialect::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(format!("Invalid dialect: {}. Must be one of: postgres, sqlite", s)),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the session provider does to the `users` table at init and shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Leave the schema alone
    None,
    /// Create the table if it is missing
    Update,
    /// Drop and recreate the table at init
    Create,
    /// Drop and recreate at init, drop again at shutdown
    CreateDrop,
}

impl SchemaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaMode::None => "none",
            SchemaMode::Update => "update",
            SchemaMode::Create => "create",
            SchemaMode::CreateDrop => "create-drop",
        }
    }
}

impl FromStr for SchemaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(SchemaMode::None),
            "update" => Ok(SchemaMode::Update),
            "create" => Ok(SchemaMode::Create),
            "create-drop" | "create_drop" => Ok(SchemaMode::CreateDrop),
            _ => Err(format!(
                "Invalid schema mode: {}. Must be one of: none, update, create, create-drop",
                s
            )),
        }
    }
}

impl fmt::Display for SchemaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `true`/`false` environment value, case-insensitively
fn parse_flag(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("Invalid {}: {}. Must be true or false", name, value)),
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub dialect: Dialect,
    pub username: Option<String>,
    pub password: Option<String>,
    pub schema_mode: SchemaMode,
    pub unique_email: bool,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub log_level: String,
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;

        let dialect = match env::var("DATABASE_DIALECT") {
            Ok(value) => value.parse::<Dialect>()?,
            Err(_) => Dialect::from_url(&url).ok_or_else(|| {
                format!(
                    "Cannot infer dialect from DATABASE_URL: {}. Set DATABASE_DIALECT",
                    url
                )
            })?,
        };

        let username = env::var("DATABASE_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("DATABASE_PASSWORD").ok().filter(|s| !s.is_empty());

        let schema_mode = match env::var("DATABASE_SCHEMA_MODE") {
            Ok(value) => value.parse::<SchemaMode>()?,
            Err(_) => SchemaMode::Update,
        };

        let unique_email = match env::var("DATABASE_UNIQUE_EMAIL") {
            Ok(value) => parse_flag("DATABASE_UNIQUE_EMAIL", &value)?,
            Err(_) => true,
        };

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(5);

        let acquire_timeout_secs = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let config = Self {
            url,
            dialect,
            username,
            password,
            schema_mode,
            unique_email,
            max_connections,
            acquire_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Config for a private in-memory SQLite database
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            dialect: Dialect::Sqlite,
            schema_mode: SchemaMode::CreateDrop,
            ..Self::default()
        }
    }

    /// Check value ranges and dialect/URL agreement
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if self.acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        if let Some(inferred) = Dialect::from_url(&self.url) {
            if inferred != self.dialect {
                return Err(format!(
                    "DATABASE_DIALECT {} does not match DATABASE_URL scheme {}",
                    self.dialect, inferred
                ));
            }
        }

        Ok(())
    }

    /// Whether the URL points at an in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        self.dialect == Dialect::Sqlite && self.url.contains(":memory:")
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/users".to_string(),
            dialect: Dialect::Postgres,
            username: None,
            password: None,
            schema_mode: SchemaMode::Update,
            unique_email: true,
            max_connections: 5,
            acquire_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        Ok(Self {
            database,
            log_level: log_level.to_lowercase(),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert_eq!(config.schema_mode, SchemaMode::Update);
        assert!(config.unique_email);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database.url, "postgresql://localhost/users");
    }

    #[test]
    fn test_dialect_from_url() {
        assert_eq!(Dialect::from_url("postgres://u:p@host/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("postgresql://host/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("sqlite://users.db"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("mysql://host/db"), None);
    }

    #[test]
    fn test_schema_mode_parse() {
        assert_eq!("create-drop".parse::<SchemaMode>(), Ok(SchemaMode::CreateDrop));
        assert_eq!("CREATE".parse::<SchemaMode>(), Ok(SchemaMode::Create));
        assert_eq!("none".parse::<SchemaMode>(), Ok(SchemaMode::None));
        assert!("validate".parse::<SchemaMode>().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("DATABASE_UNIQUE_EMAIL", "true"), Ok(true));
        assert_eq!(parse_flag("DATABASE_UNIQUE_EMAIL", "FALSE"), Ok(false));

        let err = parse_flag("DATABASE_UNIQUE_EMAIL", "yes").unwrap_err();
        assert!(err.contains("Invalid DATABASE_UNIQUE_EMAIL: yes"));
        assert!(parse_flag("DATABASE_UNIQUE_EMAIL", "").is_err());
    }

    #[test]
    fn test_from_env_rejects_bad_unique_email() {
        env::set_var("DATABASE_URL", "sqlite::memory:");
        env::set_var("DATABASE_UNIQUE_EMAIL", "yes");
        let result = DatabaseConfig::from_env();
        env::remove_var("DATABASE_UNIQUE_EMAIL");
        env::remove_var("DATABASE_URL");

        let err = result.unwrap_err();
        assert!(err.contains("Invalid DATABASE_UNIQUE_EMAIL"));
    }

    #[test]
    fn test_in_memory_config() {
        let config = DatabaseConfig::in_memory();
        assert!(config.is_in_memory());
        assert_eq!(config.schema_mode, SchemaMode::CreateDrop);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DatabaseConfig {
            max_connections: 0,
            ..DatabaseConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DatabaseConfig {
            dialect: Dialect::Sqlite,
            ..DatabaseConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
