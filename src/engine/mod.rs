//! Pure calculation stages: currency normalization, multiplier resolution,
//! points calculation. No I/O and no locking; everything here is a function
//! of its inputs.

pub mod calculator;
pub mod currency;
pub mod multipliers;

pub use calculator::{base_points, match_deltas, purchase_reward, Deltas};
pub use currency::ExchangeRateTable;
pub use multipliers::{resolve, AgeDivision, ResolvedMultipliers};
