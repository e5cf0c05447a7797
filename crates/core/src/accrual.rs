//! Hour-accrual rules for the participation ledger.
//!
//! When an event's duration is set (or explicitly recomputed), every
//! participant's `hours_awarded` is recalculated from the duration using the
//! configured [`AccrualPolicy`]. Two historical rules exist and neither is
//! assumed to be the correct one, so the rule is a deployment setting:
//!
//! - [`AccrualPolicy::LatenessDeduction`] -- `max(duration - late_minutes / 60, 0)`.
//! - [`AccrualPolicy::LeaderBonus`] -- `duration` for everyone, multiplied for
//!   the event creator when they take part as a scanner.

use serde::Serialize;

use crate::error::CoreError;

/// Default multiplier applied to the event creator under [`AccrualPolicy::LeaderBonus`].
pub const DEFAULT_LEADER_BONUS_MULTIPLIER: f64 = 1.5;

/// Configuration value selecting [`AccrualPolicy::LatenessDeduction`].
pub const POLICY_LATENESS: &str = "lateness";

/// Configuration value selecting [`AccrualPolicy::LeaderBonus`].
pub const POLICY_LEADER_BONUS: &str = "leader_bonus";

/// The rule used to turn an event duration into awarded hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AccrualPolicy {
    /// Subtract lateness (in hours) from the duration, floored at zero.
    #[default]
    LatenessDeduction,
    /// Ignore lateness; the event creator receives `duration * multiplier`.
    LeaderBonus { multiplier: f64 },
}

/// Per-participant inputs to the accrual rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticipationFacts {
    /// Minutes the scanner was late, if recorded.
    pub late_minutes: Option<i32>,
    /// Whether the participant is the event creator's own scanner record.
    pub is_event_creator: bool,
}

impl AccrualPolicy {
    /// Parse the policy from raw configuration values.
    ///
    /// `policy` defaults to [`POLICY_LATENESS`]; `multiplier` is only read for
    /// [`POLICY_LEADER_BONUS`] and defaults to
    /// [`DEFAULT_LEADER_BONUS_MULTIPLIER`].
    pub fn parse(policy: Option<&str>, multiplier: Option<&str>) -> Result<Self, CoreError> {
        match policy.map(str::trim).filter(|p| !p.is_empty()) {
            None | Some(POLICY_LATENESS) => Ok(Self::LatenessDeduction),
            Some(POLICY_LEADER_BONUS) => {
                let multiplier = match multiplier.map(str::trim).filter(|m| !m.is_empty()) {
                    None => DEFAULT_LEADER_BONUS_MULTIPLIER,
                    Some(raw) => raw.parse::<f64>().map_err(|_| {
                        CoreError::Validation(format!("Invalid leader bonus multiplier '{raw}'"))
                    })?,
                };
                if !multiplier.is_finite() || multiplier < 0.0 {
                    return Err(CoreError::Validation(format!(
                        "Leader bonus multiplier must be a non-negative number, got {multiplier}"
                    )));
                }
                Ok(Self::LeaderBonus { multiplier })
            }
            Some(other) => Err(CoreError::Validation(format!(
                "Unknown hour accrual policy '{other}' (expected '{POLICY_LATENESS}' or '{POLICY_LEADER_BONUS}')"
            ))),
        }
    }

    /// Compute the hours awarded to one participant for an event lasting
    /// `duration_hours`. The result is never negative.
    pub fn awarded_hours(&self, duration_hours: f64, facts: ParticipationFacts) -> f64 {
        let duration = sanitize(duration_hours);
        let awarded = match self {
            Self::LatenessDeduction => {
                let late_hours = f64::from(facts.late_minutes.unwrap_or(0).max(0)) / 60.0;
                duration - late_hours
            }
            Self::LeaderBonus { multiplier } if facts.is_event_creator => duration * multiplier,
            Self::LeaderBonus { .. } => duration,
        };
        sanitize(awarded)
    }
}

/// Clamp non-finite and negative values to zero.
fn sanitize(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        0.0
    }
}

/// Validate a duration submitted by a leader.
pub fn validate_duration(duration_hours: f64) -> Result<f64, CoreError> {
    if !duration_hours.is_finite() || duration_hours < 0.0 {
        return Err(CoreError::Validation(format!(
            "Duration must be a non-negative number of hours, got {duration_hours}"
        )));
    }
    Ok(duration_hours)
}

/// Validate a lateness update. Lateness minutes are dropped when the
/// participant is not marked late.
pub fn normalize_lateness(is_late: bool, late_minutes: Option<i32>) -> Result<Option<i32>, CoreError> {
    if !is_late {
        return Ok(None);
    }
    match late_minutes {
        Some(m) if m < 0 => Err(CoreError::Validation(format!(
            "Late minutes must be non-negative, got {m}"
        ))),
        Some(m) => Ok(Some(m)),
        None => Ok(Some(0)),
    }
}

/// Format fractional hours as `H:MM`, the way participant exports show them.
pub fn format_hours_minutes(hours: f64) -> String {
    let hours = sanitize(hours);
    let mut whole = hours.trunc() as i64;
    let mut minutes = ((hours - hours.trunc()) * 60.0).round() as i64;
    if minutes == 60 {
        whole += 1;
        minutes = 0;
    }
    format!("{whole}:{minutes:02}")
}
