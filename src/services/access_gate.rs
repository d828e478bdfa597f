// timegate-service/src/services/access_gate.rs
use crate::models::{TeamRecord, TeamStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DenyReason {
    Completed,
    TimeExpired,
}

impl DenyReason {
    // Status reported to locked-out callers
    pub fn status(&self) -> TeamStatus {
        match self {
            DenyReason::Completed => TeamStatus::Completed,
            DenyReason::TimeExpired => TeamStatus::TimeExpired,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

/// Decide whether a team may reach the dashboard or submit.
///
/// Expiry is lazy: an Active team whose deadline has passed is denied even if
/// nobody ever wrote `Time Expired` for it. Evaluate on every access attempt.
pub fn check_access(record: &TeamRecord, now: DateTime<Utc>) -> AccessDecision {
    evaluate(record.status, record.end_time, now)
}

pub fn evaluate(status: TeamStatus, end_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> AccessDecision {
    match status {
        TeamStatus::Completed => AccessDecision::Deny(DenyReason::Completed),
        TeamStatus::TimeExpired => AccessDecision::Deny(DenyReason::TimeExpired),
        TeamStatus::Active => match end_time {
            Some(end) if now >= end => AccessDecision::Deny(DenyReason::TimeExpired),
            _ => AccessDecision::Allow,
        },
        TeamStatus::Unarmed => AccessDecision::Allow,
    }
}
