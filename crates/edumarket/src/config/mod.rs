use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEVELOPMENT_JWT_SECRET: &str = "edumarket-development-secret";
const DEFAULT_UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the marketplace service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub mail: Option<MailConfig>,
    pub cors: CorsConfig,
    pub uploads: UploadConfig,
    pub storage: StorageConfig,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingVariable("JWT_SECRET"))
            }
            None => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        let auth = AuthConfig {
            jwt_secret,
            token_ttl_hours: parse_or("JWT_TTL_HOURS", 168)?,
            bcrypt_cost: parse_or("BCRYPT_COST", 10)?,
        };

        let mail = match non_empty("SMTP_HOST") {
            Some(host) => Some(MailConfig {
                host,
                port: parse_or("SMTP_PORT", 587)?,
                security: match non_empty("SMTP_SECURITY") {
                    Some(raw) => SmtpSecurity::parse(&raw)?,
                    None => SmtpSecurity::StartTls,
                },
                username: non_empty("SMTP_USER"),
                password: non_empty("SMTP_PASS"),
                from: non_empty("SMTP_FROM")
                    .unwrap_or_else(|| "Edumarket Support <no-reply@edumarket.local>".to_string()),
            }),
            None => None,
        };

        let cors = CorsConfig {
            allowed_origins: env::var("CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        };

        let uploads = UploadConfig {
            public_dir: PathBuf::from(
                env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string()),
            ),
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| "public/uploads".to_string()),
            ),
            max_bytes: parse_or("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_LIMIT)?,
        };

        let storage = StorageConfig {
            database_path: non_empty("DATABASE_PATH").map(PathBuf::from),
        };

        let admin_seed = match (non_empty("ADMIN_EMAIL"), non_empty("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: non_empty("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth,
            mail,
            cors,
            uploads,
            storage,
            admin_seed,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber(key)),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Token signing and password hashing parameters.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

/// Outbound SMTP relay. Absent when `SMTP_HOST` is unset.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub security: SmtpSecurity,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS, as on port 587.
    StartTls,
    /// TLS from the first byte, as on port 465.
    Tls,
    /// Unencrypted. Only for a local relay such as a mail catcher.
    Plain,
}

impl SmtpSecurity {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            "plain" | "none" => Ok(Self::Plain),
            _ => Err(ConfigError::InvalidChoice("SMTP_SECURITY")),
        }
    }
}

/// Empty `allowed_origins` means any origin is accepted.
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub public_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub max_bytes: usize,
}

/// Where records are kept. Without a database path the store lives in memory only.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub database_path: Option<PathBuf>,
}

/// Bootstrap administrator created at startup when missing.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber(&'static str),
    InvalidChoice(&'static str),
    MissingVariable(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber(key) => write!(f, "{key} must be a valid number"),
            ConfigError::InvalidChoice(key) => write!(f, "{key} has an unsupported value"),
            ConfigError::MissingVariable(key) => {
                write!(f, "{key} must be set in production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber(_)
            | ConfigError::InvalidChoice(_)
            | ConfigError::MissingVariable(_) => None,
        }
    }
}
