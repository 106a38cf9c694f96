use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::database::manager::Isolation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which store driver backs the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            "memory" | "mem" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store '{}', expected postgres or memory", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// URL prefix the document routes are mounted under
    pub mount: String,
    pub port: u16,
    /// Base collection name; shared mode prefixes it per tenant
    pub collection: String,
    /// `true`: one connection per tenant. `false`: one shared connection with prefixes.
    pub tenant_isolation: bool,
    pub default_limit: i64,
    pub store: StoreKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HMAC key used to verify bearer tokens
    #[serde(skip_serializing)]
    pub private_key: String,
    pub jwt_expiry_hours: u64,
}

impl GatewayConfig {
    pub fn isolation(&self) -> Isolation {
        if self.tenant_isolation {
            Isolation::Isolated
        } else {
            Isolation::Shared
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Gateway overrides
        if let Ok(v) = env::var("GATEWAY_MOUNT") {
            self.gateway.mount = v;
        }
        if let Some(v) = env::var("GATEWAY_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.gateway.port = v.parse().unwrap_or(self.gateway.port);
        }
        if let Ok(v) = env::var("GATEWAY_COLLECTION") {
            self.gateway.collection = v;
        }
        if let Ok(v) = env::var("GATEWAY_TENANT_ISOLATION") {
            self.gateway.tenant_isolation = v.parse().unwrap_or(self.gateway.tenant_isolation);
        }
        if let Ok(v) = env::var("GATEWAY_DEFAULT_LIMIT") {
            self.gateway.default_limit = v.parse().unwrap_or(self.gateway.default_limit);
        }
        if let Ok(v) = env::var("GATEWAY_STORE") {
            self.gateway.store = v.parse().unwrap_or(self.gateway.store);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Some(v) = env::var("GATEWAY_PRIVATE_KEY").ok().or_else(|| env::var("JWT_SECRET").ok()) {
            self.security.private_key = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    fn gateway_defaults() -> GatewayConfig {
        GatewayConfig {
            mount: "/".to_string(),
            port: 3000,
            collection: "documents".to_string(),
            tenant_isolation: true,
            default_limit: 100,
            store: StoreKind::Postgres,
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            gateway: Self::gateway_defaults(),
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                private_key: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            gateway: Self::gateway_defaults(),
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                private_key: String::new(),
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            gateway: Self::gateway_defaults(),
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                private_key: String::new(),
                jwt_expiry_hours: 4,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
