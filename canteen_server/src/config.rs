//! Server configuration
//!
//! Everything is read from `CANTEEN_*` environment variables. Bad or missing values are logged and replaced with
//! defaults; nothing here panics.
use std::env;

use canteen_common::{helpers::env_flag, Secret};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use razorpay_tools::RazorpayConfig;

use crate::errors::ServerError;

const DEFAULT_CANTEEN_HOST: &str = "127.0.0.1";
const DEFAULT_CANTEEN_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen.db";
const RANDOM_SECRET_LENGTH: usize = 48;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, `POST /orders` accepts orders that carry no payment details. They are stored as unpaid.
    pub allow_unpaid_orders: bool,
    /// Payment gateway configuration
    pub razorpay: RazorpayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CANTEEN_HOST.to_string(),
            port: DEFAULT_CANTEEN_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            allow_unpaid_orders: false,
            razorpay: RazorpayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CANTEEN_HOST").ok().unwrap_or_else(|| DEFAULT_CANTEEN_HOST.into());
        let port = env::var("CANTEEN_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CANTEEN_PORT. {e} Using the default, {DEFAULT_CANTEEN_PORT}, \
                         instead."
                    );
                    DEFAULT_CANTEEN_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CANTEEN_PORT);
        let database_url = env::var("CANTEEN_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ CANTEEN_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration. {e}. Reverting to the default configuration.");
            AuthConfig::default()
        });
        let allow_unpaid_orders = env_flag("CANTEEN_ALLOW_UNPAID_ORDERS", false);
        if allow_unpaid_orders {
            warn!("🪛️ Unpaid orders are enabled. Orders can be placed without a verified payment.");
        }
        let razorpay = RazorpayConfig::new_from_env_or_default();
        Self { host, port, database_url, auth, allow_unpaid_orders, razorpay }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HS256 secret for verifying access tokens. The identity provider signs with the same secret.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No token issued by \
             your identity provider will be accepted. DO NOT operate in production like this. 🚨️🚨️🚨️"
        );
        let secret: String =
            thread_rng().sample_iter(&Alphanumeric).take(RANDOM_SECRET_LENGTH).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("CANTEEN_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [CANTEEN_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("CANTEEN_JWT_SECRET is empty".to_string()));
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}
