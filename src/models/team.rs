use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Answers;

// Lifecycle of a team's shared timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamStatus {
    Unarmed,
    Active,
    Completed,
    #[serde(rename = "Time Expired")]
    TimeExpired,
}

impl TeamStatus {
    /// Text stored in the directory's status column. Unarmed teams leave it blank.
    pub fn as_cell(&self) -> &'static str {
        match self {
            TeamStatus::Unarmed => "",
            TeamStatus::Active => "Active",
            TeamStatus::Completed => "Completed",
            TeamStatus::TimeExpired => "Time Expired",
        }
    }

    pub fn from_cell(cell: &str) -> Option<Self> {
        match cell.trim() {
            "" => Some(TeamStatus::Unarmed),
            "Active" => Some(TeamStatus::Active),
            "Completed" => Some(TeamStatus::Completed),
            "Time Expired" | "TimeExpired" => Some(TeamStatus::TimeExpired),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TeamStatus::Completed | TeamStatus::TimeExpired)
    }
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TeamStatus::Unarmed => write!(f, "Unarmed"),
            other => write!(f, "{}", other.as_cell()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub email: String,
    pub row_position: usize,
}

/// One team as materialized from its group of directory rows.
///
/// Shared fields come from the team's first row only.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRecord {
    pub team_name: String,
    pub members: Vec<Member>,
    pub revision: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_display: Option<String>,
    pub end_display: Option<String>,
    pub first_scanner: Option<String>,
    pub status: TeamStatus,
    pub answers: Option<Answers>,
    pub answers_digest: Option<String>,
}

impl TeamRecord {
    pub fn is_armed(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    // Membership check on trimmed, lower-cased addresses
    pub fn has_member(&self, email: &str) -> bool {
        let wanted = normalize_email(email);
        self.members.iter().any(|m| normalize_email(&m.email) == wanted)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
