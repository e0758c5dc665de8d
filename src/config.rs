use crate::domain::{CurrencyCode, Points, TournamentTier};
use crate::engine::currency::ExchangeRateTable;
use rust_decimal::Decimal as RustDecimal;
use std::collections::HashMap;
use thiserror::Error;

/// Process configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        Ok(Config {
            port,
            database_path,
        })
    }
}

/// Business rules for multiplier resolution and purchase crediting.
///
/// Passed explicitly to the pure engine stages rather than living in global
/// state, so every resolution is a function of (match, snapshots, rules) and
/// testable without process-wide setup. `version` identifies which rule set
/// produced a transaction; rate changes never retroactively alter persisted
/// deltas.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub version: u32,
    /// Tournament-tier multipliers.
    pub tier_club: Points,
    pub tier_regional: Points,
    pub tier_national: Points,
    pub tier_international: Points,
    /// Adult age-division coefficients. Open division is always 1.0.
    pub division_35: Points,
    pub division_50: Points,
    pub division_60: Points,
    pub division_70: Points,
    /// Gender bonus for a below-threshold female in cross-gender singles.
    pub gender_individual_bonus: Points,
    /// Gender bonus for below-threshold members of a mixed team.
    pub gender_team_bonus: Points,
    /// Cumulative ranking points at or above which gender bonuses stop.
    pub elite_threshold: Points,
    /// Reward points credited per reference-currency unit purchased.
    pub purchase_rate: Points,
    pub exchange_rates: ExchangeRateTable,
}

fn pts(units: i64, scale: u32) -> Points {
    Points::new(RustDecimal::new(units, scale))
}

impl RulesConfig {
    /// The conservative base scheme this engine ships with.
    pub fn system_b() -> Self {
        let mut rates = ExchangeRateTable::new(CurrencyCode::new("USD"), 1);
        rates.set_rate(CurrencyCode::new("USD"), pts(10000, 4));
        rates.set_rate(CurrencyCode::new("EUR"), pts(10800, 4));
        rates.set_rate(CurrencyCode::new("GBP"), pts(12600, 4));
        rates.set_rate(CurrencyCode::new("SEK"), pts(920, 4));
        rates.set_rate(CurrencyCode::new("JPY"), pts(68, 4));

        RulesConfig {
            version: 1,
            tier_club: pts(100, 2),
            tier_regional: pts(150, 2),
            tier_national: pts(250, 2),
            tier_international: pts(400, 2),
            division_35: pts(120, 2),
            division_50: pts(130, 2),
            division_60: pts(150, 2),
            division_70: pts(160, 2),
            gender_individual_bonus: pts(115, 2),
            gender_team_bonus: pts(105, 2),
            elite_threshold: pts(100_000, 2),
            purchase_rate: pts(100, 2),
            exchange_rates: rates,
        }
    }

    /// Static multiplier for a tournament tier.
    pub fn tier_multiplier(&self, tier: TournamentTier) -> Points {
        match tier {
            TournamentTier::Club => self.tier_club,
            TournamentTier::Regional => self.tier_regional,
            TournamentTier::National => self.tier_national,
            TournamentTier::International => self.tier_international,
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::system_b()
    }
}
