use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "un segreto meno bello";
const DEFAULT_TOKEN_SECRET: &str = "un altro segreto meno bello";

/// Credentials and addressing for the WhatsApp Cloud API.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_base_url: String,
    pub api_version: String,
    pub phone_number_id: String,
    pub access_token: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub app_env: String,
    /// Attempts per unit of work before a serialization conflict surfaces.
    pub tx_max_attempts: u32,
    pub invitation_expiry_hours: i64,
    pub invitation_token_secret: String,
    pub join_link_base_url: String,
    pub notification_timeout_secs: u64,
    pub invite_concurrency: usize,
    pub whatsapp: WhatsAppConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            max_connections: 10,
            app_env: "development".to_string(),
            tx_max_attempts: 3,
            invitation_expiry_hours: 24,
            invitation_token_secret: DEFAULT_TOKEN_SECRET.to_string(),
            join_link_base_url: "https://tschwaa.com/join/".to_string(),
            notification_timeout_secs: 10,
            invite_concurrency: 16,
            whatsapp: WhatsAppConfig {
                api_base_url: "https://graph.facebook.com".to_string(),
                api_version: "v17.0".to_string(),
                phone_number_id: String::new(),
                access_token: String::new(),
                language: "fr".to_string(),
            },
        }
    }
}

/// Reads `key`, falling back to `default` when unset, and parses it.
fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("Invalid {}: cannot parse '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        let defaults = Config::default();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set in .env file".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            defaults.jwt_secret.clone()
        });

        let invitation_token_secret = env::var("INVITATION_TOKEN_SECRET").unwrap_or_else(|_| {
            warn!("INVITATION_TOKEN_SECRET not set, using default");
            defaults.invitation_token_secret.clone()
        });

        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = parse_var("SERVER_PORT", defaults.server_port)?;
        let max_connections = parse_var("MAX_DB_CONNECTIONS", defaults.max_connections)?;
        let app_env = env::var("APP_ENV").unwrap_or(defaults.app_env);

        let tx_max_attempts = parse_var("TX_MAX_ATTEMPTS", defaults.tx_max_attempts)?;
        if tx_max_attempts == 0 {
            return Err("Invalid TX_MAX_ATTEMPTS: must be at least 1".to_string());
        }

        let invitation_expiry_hours =
            parse_var("INVITATION_EXPIRY_HOURS", defaults.invitation_expiry_hours)?;
        let join_link_base_url =
            env::var("JOIN_LINK_BASE_URL").unwrap_or(defaults.join_link_base_url);
        let notification_timeout_secs =
            parse_var("NOTIFICATION_TIMEOUT_SECS", defaults.notification_timeout_secs)?;

        let invite_concurrency = parse_var("INVITE_CONCURRENCY", defaults.invite_concurrency)?;
        if invite_concurrency == 0 {
            return Err("Invalid INVITE_CONCURRENCY: must be at least 1".to_string());
        }

        let whatsapp = WhatsAppConfig {
            api_base_url: env::var("WHATSAPP_API_BASE_URL")
                .unwrap_or(defaults.whatsapp.api_base_url),
            api_version: env::var("WHATSAPP_API_VERSION").unwrap_or(defaults.whatsapp.api_version),
            phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID").unwrap_or_default(),
            access_token: env::var("WHATSAPP_ACCESS_TOKEN").unwrap_or_default(),
            language: env::var("WHATSAPP_LANGUAGE").unwrap_or(defaults.whatsapp.language),
        };

        Ok(Config {
            database_url,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            app_env,
            tx_max_attempts,
            invitation_expiry_hours,
            invitation_token_secret,
            join_link_base_url,
            notification_timeout_secs,
            invite_concurrency,
            whatsapp,
        })
    }

    pub fn invitation_expiry(&self) -> chrono::Duration {
        chrono::Duration::hours(self.invitation_expiry_hours)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_secs)
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!("Server configuration:");
        info!("  Environment: {}", self.app_env);
        info!("  Server address: {}:{}", self.server_host, self.server_port);
        info!("  Database: {}", Self::mask_url(&self.database_url));
        info!("  Max DB connections: {}", self.max_connections);
        info!("  Transaction attempts: {}", self.tx_max_attempts);
        info!("  Invitation expiry: {}h", self.invitation_expiry_hours);
        info!("  Join links: {}<token>", self.join_link_base_url);
        info!(
            "  Notifications: timeout {}s, {} concurrent invites",
            self.notification_timeout_secs, self.invite_concurrency
        );
        info!(
            "  WhatsApp: {}/{} (token {})",
            self.whatsapp.api_base_url,
            self.whatsapp.api_version,
            if self.whatsapp.access_token.is_empty() {
                "missing"
            } else {
                "configured"
            }
        );
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("  JWT secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("  JWT secret: custom secret configured");
        }
    }

    /// Maschera l'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if url.starts_with("sqlite:") {
            return url.to_string();
        }
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        "***".to_string()
    }
}
