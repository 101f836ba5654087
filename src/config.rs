//! Runtime configuration, read from the environment (and `.env`).

use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::pricing::DiscountPolicy;
use crate::StorefrontError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub token_file: PathBuf,
    pub currency: String,
    pub discount: DiscountPolicy,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_file: PathBuf::from(".storefront-token.json"),
            currency: "LKR".to_string(),
            discount: DiscountPolicy::default(),
            http_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, StorefrontError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorefrontError> {
        let mut config = Self::default();
        if let Some(url) = lookup("STOREFRONT_API_URL") { config.api_url = url; }
        if let Some(path) = lookup("STOREFRONT_TOKEN_FILE") { config.token_file = PathBuf::from(path); }
        if let Some(currency) = lookup("STOREFRONT_CURRENCY") { config.currency = currency.to_uppercase(); }
        if let Some(v) = lookup("STOREFRONT_DISCOUNT_THRESHOLD") { config.discount.threshold = parse("STOREFRONT_DISCOUNT_THRESHOLD", &v)?; }
        if let Some(v) = lookup("STOREFRONT_DISCOUNT_RATE") { config.discount.rate = parse("STOREFRONT_DISCOUNT_RATE", &v)?; }
        if let Some(v) = lookup("STOREFRONT_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse("STOREFRONT_HTTP_TIMEOUT_SECS", &v)?);
        }

        if config.discount.rate < Decimal::ZERO || config.discount.rate > Decimal::ONE {
            return Err(StorefrontError::Config(format!("STOREFRONT_DISCOUNT_RATE must be between 0 and 1, got {}", config.discount.rate)));
        }
        Ok(config)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, StorefrontError> {
    value.trim().parse().map_err(|_| StorefrontError::Config(format!("{key} has invalid value {value:?}")))
}
