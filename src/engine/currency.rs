//! Currency normalization against a fixed exchange-rate table.
//!
//! Reward points are always computed from the normalized amount, never the
//! nominal one, so the same real-world spend earns the same reward in any
//! supported currency.

use crate::domain::{CurrencyCode, Points};
use crate::error::EngineError;
use std::collections::HashMap;

/// Mapping of currency code to reference-currency rate.
///
/// Read-only at calculation time and versioned externally; a rate change
/// never retroactively alters persisted transaction deltas.
#[derive(Debug, Clone)]
pub struct ExchangeRateTable {
    reference: CurrencyCode,
    version: u32,
    rates: HashMap<CurrencyCode, Points>,
}

impl ExchangeRateTable {
    pub fn new(reference: CurrencyCode, version: u32) -> Self {
        Self {
            reference,
            version,
            rates: HashMap::new(),
        }
    }

    pub fn set_rate(&mut self, code: CurrencyCode, rate: Points) {
        self.rates.insert(code, rate);
    }

    pub fn reference(&self) -> &CurrencyCode {
        &self.reference
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rate(&self, code: &CurrencyCode) -> Option<Points> {
        self.rates.get(code).copied()
    }

    /// Express `amount` of `code` in the reference currency.
    ///
    /// Keeps 4 decimal digits internally; the final 2dp rounding happens only
    /// at reward-delta presentation, never here.
    ///
    /// # Errors
    /// `UnknownCurrency` if the code has no table entry.
    pub fn normalize(&self, amount: Points, code: &CurrencyCode) -> Result<Points, EngineError> {
        let rate = self
            .rate(code)
            .ok_or_else(|| EngineError::UnknownCurrency(code.as_str().to_string()))?;
        Ok((amount * rate).round4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn table() -> ExchangeRateTable {
        let mut t = ExchangeRateTable::new(CurrencyCode::new("USD"), 7);
        t.set_rate(CurrencyCode::new("USD"), Points::from_str("1").unwrap());
        t.set_rate(CurrencyCode::new("SEK"), Points::from_str("0.2").unwrap());
        t.set_rate(CurrencyCode::new("JPY"), Points::from_str("0.0068").unwrap());
        t
    }

    #[test]
    fn reference_currency_is_identity() {
        let t = table();
        let out = t
            .normalize(
                Points::from_str("100").unwrap(),
                &CurrencyCode::new("USD"),
            )
            .unwrap();
        assert_eq!(out.to_canonical_string(), "100");
    }

    #[test]
    fn weak_currency_normalizes_to_less() {
        let t = table();
        let weak = t
            .normalize(
                Points::from_str("100").unwrap(),
                &CurrencyCode::new("SEK"),
            )
            .unwrap();
        let strong = t
            .normalize(
                Points::from_str("100").unwrap(),
                &CurrencyCode::new("USD"),
            )
            .unwrap();
        assert!(weak < strong);
        assert_eq!(weak.to_canonical_string(), "20");
    }

    #[test]
    fn keeps_four_decimal_digits() {
        let t = table();
        // 3.333 * 0.0068 = 0.0226644 -> 0.0227 at 4dp, not 0.02.
        let out = t
            .normalize(
                Points::from_str("3.333").unwrap(),
                &CurrencyCode::new("JPY"),
            )
            .unwrap();
        assert_eq!(out.to_canonical_string(), "0.0227");
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let t = table();
        let err = t
            .normalize(Points::from_str("1").unwrap(), &CurrencyCode::new("XXX"))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownCurrency(code) if code == "XXX"));
    }

    #[test]
    fn version_is_exposed() {
        assert_eq!(table().version(), 7);
        assert_eq!(table().reference().as_str(), "USD");
    }
}
