use dukkan_cart::DeliveryPolicy;
use dukkan_core::payment::RetryPolicy;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub thawani: ThawaniSettings,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Externally visible base URL, used to build the gateway's
    /// success/cancel return URLs.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Payment provider configuration surface.
#[derive(Debug, Deserialize, Clone)]
pub struct ThawaniSettings {
    pub secret_key: String,
    pub publishable_key: String,
    pub base_url: String,
    /// Mirrors tried in order after `base_url`.
    #[serde(default)]
    pub fallback_urls: Vec<String>,
    pub webhook_secret: String,
    /// Fabricate a local session when the provider is unreachable instead of
    /// blocking the sale.
    #[serde(default)]
    pub mock_mode: bool,
    /// Probe the hosted pay page before trusting a freshly created session.
    #[serde(default = "default_true")]
    pub check_checkout_health: bool,
    /// See `CheckoutPolicy::assume_success_on_ambiguous_return`.
    #[serde(default)]
    pub assume_success_on_ambiguous_return: bool,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub currency: String,
    pub delivery_fee: f64,
    pub free_delivery_threshold: f64,
}

impl BusinessRules {
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            fee: Decimal::from_f64(self.delivery_fee).unwrap_or(Decimal::ZERO),
            free_threshold: Decimal::from_f64(self.free_delivery_threshold)
                .unwrap_or(Decimal::ZERO),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // `DUKKAN__THAWANI__SECRET_KEY=...` overrides the file value.
            .add_source(config::Environment::with_prefix("DUKKAN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_policy_conversion() {
        let rules = BusinessRules {
            currency: "OMR".to_string(),
            delivery_fee: 2.0,
            free_delivery_threshold: 20.0,
        };
        let policy = rules.delivery_policy();
        assert_eq!(policy.fee, Decimal::from(2));
        assert_eq!(policy.free_threshold, Decimal::from(20));
        assert_eq!(policy.fee_for(Decimal::from(5)), Decimal::from(2));
        assert_eq!(policy.fee_for(Decimal::from(20)), Decimal::ZERO);
    }
}
