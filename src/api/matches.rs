use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{
    AgePool, Gender, MatchFormat, MatchId, MatchParticipant, MatchResult, MatchSide, PlayerId,
    PointsTransaction, TournamentTier,
};
use crate::error::EngineError;
use crate::scoring::ScoreOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMatchRequest {
    pub match_id: String,
    pub tier: TournamentTier,
    pub format: MatchFormat,
    pub pool: AgePool,
    pub sides: Vec<SideDto>,
    pub winning_side: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideDto {
    pub players: Vec<ParticipantDto>,
    pub score: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub player_id: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMatchResponse {
    pub transactions: Vec<TransactionDto>,
}

/// Transaction representation shared by the scoring endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub transaction_id: String,
    pub idempotency_key: String,
    pub source_id: String,
    pub player_id: String,
    pub transaction_type: String,
    pub base_points: String,
    pub multipliers: Vec<MultiplierDto>,
    pub ranking_delta: String,
    pub reward_delta: String,
    pub time_ms: i64,
    /// Present on scoring responses: true when the call was a replay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_applied: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplierDto {
    pub name: String,
    pub value: String,
}

impl TransactionDto {
    pub fn from_outcome(outcome: &ScoreOutcome) -> Self {
        Self::from_transaction(&outcome.transaction, Some(outcome.already_applied))
    }

    pub fn from_transaction(tx: &PointsTransaction, already_applied: Option<bool>) -> Self {
        TransactionDto {
            transaction_id: tx.transaction_id.to_string(),
            idempotency_key: tx.idempotency_key.clone(),
            source_id: tx.source_id.clone(),
            player_id: tx.player_id.as_str().to_string(),
            transaction_type: tx.transaction_type.to_string(),
            base_points: tx.base_points.to_canonical_string(),
            multipliers: tx
                .multipliers
                .iter()
                .map(|m| MultiplierDto {
                    name: m.name.clone(),
                    value: m.value.to_canonical_string(),
                })
                .collect(),
            ranking_delta: tx.ranking_delta.to_canonical_string(),
            reward_delta: tx.reward_delta.to_canonical_string(),
            time_ms: tx.time_ms.as_ms(),
            already_applied,
        }
    }
}

pub async fn score_match(
    State(state): State<AppState>,
    Json(req): Json<ScoreMatchRequest>,
) -> Result<Json<ScoreMatchResponse>, EngineError> {
    let match_result = to_match_result(req)?;

    let outcomes = state.service.score_match(&match_result).await?;

    Ok(Json(ScoreMatchResponse {
        transactions: outcomes.iter().map(TransactionDto::from_outcome).collect(),
    }))
}

fn to_match_result(req: ScoreMatchRequest) -> Result<MatchResult, EngineError> {
    let sides: Vec<MatchSide> = req
        .sides
        .into_iter()
        .map(|side| MatchSide {
            players: side
                .players
                .into_iter()
                .map(|p| MatchParticipant {
                    player_id: PlayerId::new(p.player_id),
                    age: p.age,
                    gender: p.gender,
                })
                .collect(),
            score: side.score,
        })
        .collect();

    let sides: [MatchSide; 2] = sides.try_into().map_err(|_| {
        EngineError::InvalidMatchResult("a match must have exactly two sides".to_string())
    })?;

    Ok(MatchResult {
        match_id: MatchId::new(req.match_id),
        tier: req.tier,
        format: req.format,
        pool: req.pool,
        sides,
        winning_side: req.winning_side,
    })
}
