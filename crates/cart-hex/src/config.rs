use anyhow::Context;
use cart_types::domain::money::Money;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub snapshot_key: String,
    pub orders_api_url: Option<String>,
    pub orders_api_key: Option<String>,
    pub delivery_fee: Money,
    pub delivery_eta_minutes: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL");
        let snapshot_key = lookup("CART_SNAPSHOT_KEY").unwrap_or_else(|| "cart".into());
        let orders_api_url = lookup("ORDERS_API_URL");
        let orders_api_key = lookup("ORDERS_API_KEY");
        let delivery_fee = match lookup("DELIVERY_FEE") {
            Some(raw) => raw
                .parse::<Money>()
                .with_context(|| format!("invalid DELIVERY_FEE {raw:?}"))?,
            None => Money::from_cents(200),
        };
        if delivery_fee.is_negative() {
            anyhow::bail!("DELIVERY_FEE must not be negative");
        }
        delivery_fee.bounded().context("DELIVERY_FEE is too large")?;
        let delivery_eta_minutes = match lookup("DELIVERY_ETA_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("invalid DELIVERY_ETA_MINUTES {raw:?}"))?,
            None => 30,
        };
        if delivery_eta_minutes <= 0 {
            anyhow::bail!("DELIVERY_ETA_MINUTES must be positive");
        }
        Ok(Self {
            database_url,
            snapshot_key,
            orders_api_url,
            orders_api_key,
            delivery_fee,
            delivery_eta_minutes,
        })
    }
}
