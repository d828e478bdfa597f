// timegate-service/src/models/submission.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::TeamStatus;
use crate::services::countdown::Countdown;

/// Question id -> free-text or choice response.
pub type Answers = BTreeMap<String, String>;

// Every submission must answer all of these
pub const QUESTION_KEYS: [&str; 7] = ["q1", "q2", "q3", "q4", "q5", "q6", "q7"];

// Request body for answer submission
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub team_name: Option<String>,
    #[serde(default)]
    pub answers: Answers,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub answers_digest: String,
}

// Response for a successful arm or resume
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub team_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_time_display: String,
    pub end_time_display: String,
    pub first_scanner: String,
    pub current_scanner: String,
    pub is_first_armer: bool,
}

// Returned whenever the access gate denies entry
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LockedResponse {
    pub locked: bool,
    pub status: TeamStatus,
    pub team_name: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub team_name: String,
    pub end_time: DateTime<Utc>,
    pub end_time_display: String,
    pub first_scanner: String,
    pub remaining: Countdown,
}
