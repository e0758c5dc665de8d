//! Multiplier resolution: tournament tier, age division, gender bonus.
//!
//! Pure function of (match result, ledger snapshots, rules). The chain order
//! is fixed: tier first, then age division, then gender bonus. Every entry is
//! recorded even when its value is 1.0, so the transaction log always carries
//! the full breakdown.

use crate::config::RulesConfig;
use crate::domain::{
    AgePool, AppliedMultiplier, Gender, MatchFormat, MatchResult, ParticipantLedger, PlayerId,
    Points,
};
use crate::error::EngineError;
use std::collections::HashMap;

pub const TIER_MULTIPLIER: &str = "tournament_tier";
pub const AGE_MULTIPLIER: &str = "age_division";
pub const GENDER_MULTIPLIER: &str = "gender_bonus";

/// Age division a participant competes in, derived from their own age.
///
/// Youth divisions belong to a separate pool and never mix with adult
/// coefficients; they exist here only so the parity rule can compare them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeDivision {
    Open,
    Senior35,
    Senior50,
    Senior60,
    Senior70,
    YouthU12,
    YouthU15,
    YouthU18,
}

impl AgeDivision {
    pub fn from_age(pool: AgePool, age: u32) -> Self {
        match pool {
            AgePool::Youth => match age {
                0..=12 => AgeDivision::YouthU12,
                13..=15 => AgeDivision::YouthU15,
                _ => AgeDivision::YouthU18,
            },
            AgePool::Adult => match age {
                0..=34 => AgeDivision::Open,
                35..=49 => AgeDivision::Senior35,
                50..=59 => AgeDivision::Senior50,
                60..=69 => AgeDivision::Senior60,
                _ => AgeDivision::Senior70,
            },
        }
    }

    /// Coefficient when divisions are mixed within a match. Open and all
    /// youth divisions stay at 1.0.
    pub fn coefficient(&self, rules: &RulesConfig) -> Points {
        match self {
            AgeDivision::Open
            | AgeDivision::YouthU12
            | AgeDivision::YouthU15
            | AgeDivision::YouthU18 => Points::one(),
            AgeDivision::Senior35 => rules.division_35,
            AgeDivision::Senior50 => rules.division_50,
            AgeDivision::Senior60 => rules.division_60,
            AgeDivision::Senior70 => rules.division_70,
        }
    }
}

/// The resolved, ordered multiplier chain for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMultipliers {
    pub player_id: PlayerId,
    pub multipliers: Vec<AppliedMultiplier>,
}

impl ResolvedMultipliers {
    /// Product of the chain, unrounded.
    pub fn product(&self) -> Points {
        self.multipliers
            .iter()
            .fold(Points::one(), |acc, m| acc * m.value)
    }
}

struct Resolved {
    player_id: PlayerId,
    side: usize,
    gender: Gender,
    ranking_points: Points,
    division: AgeDivision,
}

/// Resolve the multiplier chain for every participant of a match.
///
/// `snapshots` must hold a ledger snapshot (possibly freshly seeded) for
/// every participant; snapshots are read-only here.
///
/// # Errors
/// - `IncompleteParticipantProfile` when a snapshot lacks age or gender;
///   defaulting silently would corrupt a permanent record.
/// - `InvalidMatchResult` when a declared mixed match has a same-gender team.
pub fn resolve(
    match_result: &MatchResult,
    snapshots: &HashMap<PlayerId, ParticipantLedger>,
    rules: &RulesConfig,
) -> Result<Vec<ResolvedMultipliers>, EngineError> {
    let contexts = build_contexts(match_result, snapshots)?;

    if match_result.format == MatchFormat::Mixed {
        ensure_mixed_teams(&contexts)?;
    }

    let tier_value = rules.tier_multiplier(match_result.tier);
    let same_division = contexts
        .windows(2)
        .all(|pair| pair[0].division == pair[1].division);

    let mut resolved = Vec::with_capacity(contexts.len());
    for ctx in &contexts {
        let age_value = if same_division {
            // Parity rule: division only matters when divisions are mixed.
            Points::one()
        } else {
            ctx.division.coefficient(rules)
        };

        let gender_value = gender_bonus(ctx, &contexts, rules);

        resolved.push(ResolvedMultipliers {
            player_id: ctx.player_id.clone(),
            multipliers: vec![
                AppliedMultiplier::new(TIER_MULTIPLIER, tier_value),
                AppliedMultiplier::new(AGE_MULTIPLIER, age_value),
                AppliedMultiplier::new(GENDER_MULTIPLIER, gender_value),
            ],
        });
    }

    Ok(resolved)
}

fn build_contexts(
    match_result: &MatchResult,
    snapshots: &HashMap<PlayerId, ParticipantLedger>,
) -> Result<Vec<Resolved>, EngineError> {
    let mut contexts = Vec::new();
    for (side, match_side) in match_result.sides.iter().enumerate() {
        for participant in &match_side.players {
            let snapshot = snapshots.get(&participant.player_id).ok_or_else(|| {
                EngineError::Internal(format!(
                    "no ledger snapshot for participant {}",
                    participant.player_id
                ))
            })?;

            let age = snapshot.age.ok_or_else(|| {
                EngineError::IncompleteParticipantProfile {
                    player_id: participant.player_id.as_str().to_string(),
                    missing: "age".to_string(),
                }
            })?;
            let gender = snapshot.gender.ok_or_else(|| {
                EngineError::IncompleteParticipantProfile {
                    player_id: participant.player_id.as_str().to_string(),
                    missing: "gender".to_string(),
                }
            })?;

            contexts.push(Resolved {
                player_id: participant.player_id.clone(),
                side,
                gender,
                ranking_points: snapshot.ranking_points,
                division: AgeDivision::from_age(match_result.pool, age),
            });
        }
    }
    Ok(contexts)
}

fn ensure_mixed_teams(contexts: &[Resolved]) -> Result<(), EngineError> {
    for side in 0..2 {
        let mut females = 0;
        let mut males = 0;
        for ctx in contexts.iter().filter(|c| c.side == side) {
            match ctx.gender {
                Gender::Female => females += 1,
                Gender::Male => males += 1,
            }
        }
        if females != 1 || males != 1 {
            return Err(EngineError::InvalidMatchResult(format!(
                "mixed format requires one participant of each gender per side, side {} has {} female / {} male",
                side, females, males
            )));
        }
    }
    Ok(())
}

/// Gender-bonus coefficient for one participant.
///
/// Exactly one of the team or individual bonus can apply, never both:
/// a mixed team takes the team coefficient, otherwise a female facing
/// cross-gender opposition takes the individual coefficient. Participants at
/// or above the elite threshold never receive a bonus.
fn gender_bonus(ctx: &Resolved, contexts: &[Resolved], rules: &RulesConfig) -> Points {
    if ctx.ranking_points >= rules.elite_threshold {
        return Points::one();
    }

    let on_mixed_team = contexts
        .iter()
        .any(|other| other.side == ctx.side && other.gender != ctx.gender);
    if on_mixed_team {
        return rules.gender_team_bonus;
    }

    let cross_gender_opposition = contexts
        .iter()
        .any(|other| other.side != ctx.side && other.gender != ctx.gender);
    if cross_gender_opposition && ctx.gender == Gender::Female {
        return rules.gender_individual_bonus;
    }

    Points::one()
}
