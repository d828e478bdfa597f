// timegate-service/src/services/submission_recorder.rs
use crate::models::{Answers, ServiceError, TeamStatus, QUESTION_KEYS};
use crate::services::access_gate::{check_access, AccessDecision};
use crate::utils::team_directory::{columns, load_team, ColumnRange, DirectoryError, TeamDirectory};
use chrono::{DateTime, Utc};
use log::{info, warn};
use sha2::{Digest, Sha256};

// status, answers_digest, q1..q7 in one write
const SUBMIT_RANGE: ColumnRange = ColumnRange::new(columns::STATUS, columns::WIDTH - 1);

const MAX_SUBMIT_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub team_name: String,
    pub answers_digest: String,
}

// Required question keys whose answer is absent or blank
pub fn missing_answers(answers: &Answers) -> Vec<String> {
    QUESTION_KEYS
        .iter()
        .filter(|key| answers.get(**key).map_or(true, |value| value.trim().is_empty()))
        .map(|key| key.to_string())
        .collect()
}

/// SHA-256 over the required answers in question order.
pub fn answers_digest(answers: &Answers) -> String {
    let mut hasher = Sha256::new();
    for key in QUESTION_KEYS.iter() {
        let value = answers.get(*key).map(|v| v.trim()).unwrap_or("");
        hasher.update(key.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(value.as_bytes());
        hasher.update(b"\x1e");
    }
    format!("{:x}", hasher.finalize())
}

/// Record the team's answers and close it as Completed.
///
/// Closed teams are rejected before anything else is looked at. The answers,
/// their digest and the status flip go out as one conditional write on the
/// revision read here, so a teammate closing the team in between is caught
/// and reported as `AlreadyClosed` on the re-read.
pub fn submit(
    directory: &dyn TeamDirectory,
    team_name: &str,
    answers: &Answers,
    now: DateTime<Utc>,
) -> Result<SubmissionReceipt, ServiceError> {
    for attempt in 1..=MAX_SUBMIT_ATTEMPTS {
        let record = load_team(directory, team_name)?.ok_or(ServiceError::NotRegistered)?;

        if let AccessDecision::Deny(reason) = check_access(&record, now) {
            warn!("❌ Submission for team {} refused: {:?}", team_name, reason);
            return Err(ServiceError::AlreadyClosed(reason.status()));
        }

        if !record.is_armed() {
            return Err(ServiceError::TimerNotStarted);
        }

        let missing = missing_answers(answers);
        if !missing.is_empty() {
            return Err(ServiceError::IncompleteAnswers(missing));
        }

        let digest = answers_digest(answers);
        let mut values = Vec::with_capacity(SUBMIT_RANGE.width());
        values.push(TeamStatus::Completed.as_cell().to_string());
        values.push(digest.clone());
        values.extend(
            QUESTION_KEYS
                .iter()
                .map(|key| answers.get(*key).map(|v| v.trim().to_string()).unwrap_or_default()),
        );

        match directory.write_range(team_name, SUBMIT_RANGE, &values, Some(&record.revision)) {
            Ok(_) => {
                info!("✅ Team {} completed, answers digest {}", team_name, digest);
                return Ok(SubmissionReceipt {
                    team_name: team_name.to_string(),
                    answers_digest: digest,
                });
            }
            Err(DirectoryError::Conflict { .. }) => {
                warn!(
                    "Team {} changed during submission (attempt {}/{}), re-checking",
                    team_name, attempt, MAX_SUBMIT_ATTEMPTS
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::DirectoryUnavailable(format!(
        "submission for team {} did not settle after {} attempts",
        team_name, MAX_SUBMIT_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::timer_engine::arm_or_resume;
    use crate::utils::display_time::DisplayFormat;
    use crate::utils::team_directory::InMemoryDirectory;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 9, 0, 0, 0).unwrap()
    }

    fn full_answers() -> Answers {
        QUESTION_KEYS
            .iter()
            .map(|key| (key.to_string(), format!("answer to {}", key)))
            .collect()
    }

    fn armed_falcon() -> InMemoryDirectory {
        let directory = InMemoryDirectory::with_roster(&[("Falcon", "a@falcon.io"), ("Falcon", "b@falcon.io")]);
        arm_or_resume(
            &directory,
            &DisplayFormat::from_offset_minutes(0),
            "Falcon",
            "a@falcon.io",
            t0(),
        )
        .unwrap();
        directory
    }

    #[test]
    fn complete_answers_close_the_team() {
        let directory = armed_falcon();
        let receipt = submit(&directory, "Falcon", &full_answers(), t0() + Duration::hours(2)).unwrap();
        assert_eq!(receipt.answers_digest, answers_digest(&full_answers()));

        let team = load_team(&directory, "Falcon").unwrap().unwrap();
        assert_eq!(team.status, TeamStatus::Completed);
        assert_eq!(team.answers.unwrap()["q4"], "answer to q4");
        assert_eq!(team.answers_digest.as_deref(), Some(receipt.answers_digest.as_str()));
    }

    #[test]
    fn blank_answers_are_rejected_without_writing() {
        let directory = armed_falcon();
        let mut answers = full_answers();
        answers.insert("q3".to_string(), "   ".to_string());
        answers.remove("q7");

        let result = submit(&directory, "Falcon", &answers, t0() + Duration::hours(2));
        match result {
            Err(ServiceError::IncompleteAnswers(missing)) => assert_eq!(missing, vec!["q3", "q7"]),
            other => panic!("expected incomplete answers, got {:?}", other),
        }

        let team = load_team(&directory, "Falcon").unwrap().unwrap();
        assert_eq!(team.status, TeamStatus::Active);
        assert_eq!(directory.write_count(), 1);
    }

    #[test]
    fn second_submission_is_already_closed() {
        let directory = armed_falcon();
        submit(&directory, "Falcon", &full_answers(), t0() + Duration::hours(1)).unwrap();

        let mut other = full_answers();
        other.insert("q1".to_string(), "changed my mind".to_string());
        let result = submit(&directory, "Falcon", &other, t0() + Duration::hours(2));
        assert!(matches!(result, Err(ServiceError::AlreadyClosed(TeamStatus::Completed))));

        // Closed wins even over an incomplete payload
        let empty = submit(&directory, "Falcon", &Answers::new(), t0() + Duration::hours(2));
        assert!(matches!(empty, Err(ServiceError::AlreadyClosed(TeamStatus::Completed))));

        let team = load_team(&directory, "Falcon").unwrap().unwrap();
        assert_eq!(team.answers.unwrap()["q1"], "answer to q1");
    }

    #[test]
    fn expired_team_cannot_submit() {
        let directory = armed_falcon();
        let result = submit(&directory, "Falcon", &full_answers(), t0() + Duration::hours(24));
        assert!(matches!(result, Err(ServiceError::AlreadyClosed(TeamStatus::TimeExpired))));
        assert_eq!(directory.write_count(), 1);
    }

    #[test]
    fn unarmed_team_cannot_submit() {
        let directory = InMemoryDirectory::with_roster(&[("Falcon", "a@falcon.io")]);
        let result = submit(&directory, "Falcon", &full_answers(), t0());
        assert!(matches!(result, Err(ServiceError::TimerNotStarted)));
    }

    #[test]
    fn failed_write_leaves_team_open_for_retry() {
        let directory = armed_falcon();
        directory.set_unavailable(false, true);
        let result = submit(&directory, "Falcon", &full_answers(), t0() + Duration::hours(1));
        assert!(matches!(result, Err(ServiceError::DirectoryUnavailable(_))));

        directory.set_unavailable(false, false);
        submit(&directory, "Falcon", &full_answers(), t0() + Duration::hours(1)).unwrap();
    }

    #[test]
    fn digest_ignores_surrounding_whitespace_and_extra_keys() {
        let mut padded = full_answers();
        padded.insert("q2".to_string(), "  answer to q2\n".to_string());
        padded.insert("bonus".to_string(), "ignored".to_string());
        assert_eq!(answers_digest(&padded), answers_digest(&full_answers()));
    }
}
