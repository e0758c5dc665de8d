pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod scoring;

pub use config::{Config, RulesConfig};
pub use db::{init_db, ReconcileReport, Repository};
pub use domain::{
    AgePool, CurrencyCode, Gender, MatchFormat, MatchId, MatchParticipant, MatchResult, MatchSide,
    ParticipantLedger, PlayerId, Points, PointsTransaction, TimeMs, TournamentTier,
    TransactionType,
};
pub use engine::ExchangeRateTable;
pub use error::EngineError;
pub use scoring::{ScoreOutcome, ScoringService};
