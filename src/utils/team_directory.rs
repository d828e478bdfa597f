// timegate-service/src/utils/team_directory.rs
use crate::models::{normalize_email, Answers, Member, ServiceError, TeamRecord, TeamStatus, QUESTION_KEYS};
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// One directory row: a roster entry, plus the team's shared fields when it is
/// the first row of its team.
pub type Row = Vec<String>;

// Fixed column layout of every row
pub mod columns {
    use super::QUESTION_KEYS;

    pub const TEAM_NAME: usize = 0;
    pub const MEMBER_EMAIL: usize = 1;
    pub const REVISION: usize = 2;
    pub const START_DISPLAY: usize = 3;
    pub const END_DISPLAY: usize = 4;
    pub const START_AT: usize = 5;
    pub const END_AT: usize = 6;
    pub const FIRST_SCANNER: usize = 7;
    pub const STATUS: usize = 8;
    pub const ANSWERS_DIGEST: usize = 9;
    pub const ANSWERS_START: usize = 10;
    pub const WIDTH: usize = ANSWERS_START + QUESTION_KEYS.len();

    // Roster columns and the revision token are never written through write_range
    pub const FIRST_WRITABLE: usize = START_DISPLAY;
}

/// Inclusive span of columns on a team's first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub first: usize,
    pub last: usize,
}

impl ColumnRange {
    pub const fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub fn width(&self) -> usize {
        self.last + 1 - self.first
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    Unavailable(String),
    TeamNotFound(String),
    Conflict { expected: String, actual: String },
    InvalidWrite(String),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DirectoryError::Unavailable(msg) => write!(f, "directory unavailable: {}", msg),
            DirectoryError::TeamNotFound(team) => write!(f, "team not found: {}", team),
            DirectoryError::Conflict { expected, actual } => {
                write!(f, "revision conflict: expected '{}', found '{}'", expected, actual)
            }
            DirectoryError::InvalidWrite(msg) => write!(f, "invalid write: {}", msg),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl From<DirectoryError> for ServiceError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::TeamNotFound(_) => ServiceError::NotRegistered,
            DirectoryError::InvalidWrite(msg) => {
                error!("❌ Rejected directory write: {}", msg);
                ServiceError::InternalServerError
            }
            other => ServiceError::DirectoryUnavailable(other.to_string()),
        }
    }
}

/// Ordered-row store keyed by team name.
///
/// `write_range` targets the first row of `team_name`. When `expected_revision`
/// is given the write only lands if the row still carries that revision, which
/// gives callers a compare-and-set over the team's shared fields. Every write
/// rotates the revision and returns the new one.
pub trait TeamDirectory: Send + Sync {
    fn read_all(&self) -> Result<Vec<Row>, DirectoryError>;

    fn write_range(
        &self,
        team_name: &str,
        range: ColumnRange,
        values: &[String],
        expected_revision: Option<&str>,
    ) -> Result<String, DirectoryError>;
}

// Shared write path for every directory implementation
pub(crate) fn apply_write(
    rows: &mut [Row],
    team_name: &str,
    range: ColumnRange,
    values: &[String],
    expected_revision: Option<&str>,
) -> Result<String, DirectoryError> {
    if range.first < columns::FIRST_WRITABLE || range.last >= columns::WIDTH || range.first > range.last {
        return Err(DirectoryError::InvalidWrite(format!(
            "column range {}..={} is not writable",
            range.first, range.last
        )));
    }

    if values.len() != range.width() {
        return Err(DirectoryError::InvalidWrite(format!(
            "expected {} values, got {}",
            range.width(),
            values.len()
        )));
    }

    let row = rows
        .iter_mut()
        .find(|row| cell(row, columns::TEAM_NAME) == team_name)
        .ok_or_else(|| DirectoryError::TeamNotFound(team_name.to_string()))?;

    pad_row(row);

    if let Some(expected) = expected_revision {
        if row[columns::REVISION] != expected {
            return Err(DirectoryError::Conflict {
                expected: expected.to_string(),
                actual: row[columns::REVISION].clone(),
            });
        }
    }

    for (offset, value) in values.iter().enumerate() {
        row[range.first + offset] = value.clone();
    }

    let revision = Uuid::new_v4().to_string();
    row[columns::REVISION] = revision.clone();

    debug!(
        "Wrote columns {}..={} for team {}, revision {}",
        range.first, range.last, team_name, revision
    );
    Ok(revision)
}

pub(crate) fn pad_row(row: &mut Row) {
    if row.len() < columns::WIDTH {
        row.resize(columns::WIDTH, String::new());
    }
}

fn cell(row: &Row, column: usize) -> &str {
    row.get(column).map(|value| value.trim()).unwrap_or("")
}

fn optional_cell(row: &Row, column: usize) -> Option<String> {
    let value = cell(row, column);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_instant(row: &Row, column: usize, team_name: &str) -> Result<Option<DateTime<Utc>>, ServiceError> {
    match optional_cell(row, column) {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|instant| Some(instant.with_timezone(&Utc)))
            .map_err(|e| {
                error!("❌ Team {} has an unreadable instant '{}': {:?}", team_name, raw, e);
                ServiceError::CorruptRecord(format!("malformed timestamp for team {}", team_name))
            }),
    }
}

/// Build the record for `team_name` out of all rows carrying that name.
pub fn parse_team(rows: &[Row], team_name: &str) -> Result<Option<TeamRecord>, ServiceError> {
    let mut members = Vec::new();
    let mut first_row: Option<&Row> = None;

    for (position, row) in rows.iter().enumerate() {
        if cell(row, columns::TEAM_NAME) != team_name {
            continue;
        }
        if first_row.is_none() {
            first_row = Some(row);
        }
        let email = cell(row, columns::MEMBER_EMAIL);
        if !email.is_empty() {
            members.push(Member {
                email: email.to_string(),
                row_position: position,
            });
        }
    }

    let first_row = match first_row {
        Some(row) => row,
        None => return Ok(None),
    };

    let start_time = parse_instant(first_row, columns::START_AT, team_name)?;
    let end_time = parse_instant(first_row, columns::END_AT, team_name)?;

    if start_time.is_some() != end_time.is_some() {
        error!("❌ Team {} has only one of start/end set", team_name);
        return Err(ServiceError::CorruptRecord(format!(
            "half-armed timer for team {}",
            team_name
        )));
    }

    let raw_status = cell(first_row, columns::STATUS);
    let mut status = TeamStatus::from_cell(raw_status).ok_or_else(|| {
        error!("❌ Team {} has unknown status '{}'", team_name, raw_status);
        ServiceError::CorruptRecord(format!("unknown status for team {}", team_name))
    })?;

    // An armed timer with a blank status cell still counts as running
    if status == TeamStatus::Unarmed && start_time.is_some() {
        warn!("Team {} is armed but has no status, treating as Active", team_name);
        status = TeamStatus::Active;
    }

    let answers = if status == TeamStatus::Completed {
        let recorded: Answers = QUESTION_KEYS
            .iter()
            .enumerate()
            .map(|(index, key)| (key.to_string(), cell(first_row, columns::ANSWERS_START + index).to_string()))
            .collect();
        Some(recorded)
    } else {
        None
    };

    Ok(Some(TeamRecord {
        team_name: team_name.to_string(),
        members,
        revision: cell(first_row, columns::REVISION).to_string(),
        start_time,
        end_time,
        start_display: optional_cell(first_row, columns::START_DISPLAY),
        end_display: optional_cell(first_row, columns::END_DISPLAY),
        first_scanner: optional_cell(first_row, columns::FIRST_SCANNER),
        status,
        answers,
        answers_digest: optional_cell(first_row, columns::ANSWERS_DIGEST),
    }))
}

// Load one team by name
pub fn load_team(directory: &dyn TeamDirectory, team_name: &str) -> Result<Option<TeamRecord>, ServiceError> {
    let rows = directory.read_all()?;
    parse_team(&rows, team_name)
}

// Find the team whose roster contains this email. First match wins.
pub fn find_team_for_email(directory: &dyn TeamDirectory, email: &str) -> Result<TeamRecord, ServiceError> {
    let rows = directory.read_all()?;
    let wanted = normalize_email(email);

    let team_name = rows
        .iter()
        .find(|row| normalize_email(cell(row, columns::MEMBER_EMAIL)) == wanted && !wanted.is_empty())
        .map(|row| cell(row, columns::TEAM_NAME).to_string())
        .ok_or(ServiceError::NotRegistered)?;

    parse_team(&rows, &team_name)?.ok_or(ServiceError::NotRegistered)
}

/// Directory held in process memory. Backs the tests and can simulate an
/// unreachable store.
pub struct InMemoryDirectory {
    rows: Mutex<Vec<Row>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    // Roster-only rows from (team, email) pairs
    pub fn with_roster(roster: &[(&str, &str)]) -> Self {
        let rows = roster
            .iter()
            .map(|(team, email)| {
                let mut row = vec![team.to_string(), email.to_string()];
                pad_row(&mut row);
                row
            })
            .collect();
        Self::new(rows)
    }

    pub fn set_unavailable(&self, reads: bool, writes: bool) {
        self.fail_reads.store(reads, Ordering::SeqCst);
        self.fail_writes.store(writes, Ordering::SeqCst);
    }

    // Number of writes that actually landed
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Row> {
        match self.rows.lock() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TeamDirectory for InMemoryDirectory {
    fn read_all(&self) -> Result<Vec<Row>, DirectoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("reads disabled".to_string()));
        }
        let rows = self
            .rows
            .lock()
            .map_err(|e| DirectoryError::Unavailable(format!("Lock error: {:?}", e)))?;
        Ok(rows.clone())
    }

    fn write_range(
        &self,
        team_name: &str,
        range: ColumnRange,
        values: &[String],
        expected_revision: Option<&str>,
    ) -> Result<String, DirectoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("writes disabled".to_string()));
        }
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| DirectoryError::Unavailable(format!("Lock error: {:?}", e)))?;
        let revision = apply_write(&mut rows, team_name, range, values, expected_revision)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn falcon() -> InMemoryDirectory {
        InMemoryDirectory::with_roster(&[
            ("Falcon", "a@falcon.io"),
            ("Falcon", "b@falcon.io"),
            ("Heron", "c@heron.io"),
        ])
    }

    #[test]
    fn groups_rows_by_team_name() {
        let directory = falcon();
        let team = load_team(&directory, "Falcon").unwrap().unwrap();
        assert_eq!(team.members.len(), 2);
        assert_eq!(team.members[1].row_position, 1);
        assert_eq!(team.status, TeamStatus::Unarmed);
        assert!(!team.is_armed());
        assert!(load_team(&directory, "Osprey").unwrap().is_none());
    }

    #[test]
    fn finds_team_by_email_ignoring_case_and_whitespace() {
        let directory = falcon();
        let team = find_team_for_email(&directory, "  B@Falcon.IO ").unwrap();
        assert_eq!(team.team_name, "Falcon");

        let missing = find_team_for_email(&directory, "nobody@falcon.io");
        assert!(matches!(missing, Err(ServiceError::NotRegistered)));
    }

    #[test]
    fn conditional_write_rejects_stale_revision() {
        let directory = falcon();
        let range = ColumnRange::new(columns::FIRST_SCANNER, columns::FIRST_SCANNER);

        let first = directory
            .write_range("Falcon", range, &["a@falcon.io".to_string()], Some(""))
            .unwrap();

        let stale = directory.write_range("Falcon", range, &["b@falcon.io".to_string()], Some(""));
        assert!(matches!(stale, Err(DirectoryError::Conflict { .. })));

        directory
            .write_range("Falcon", range, &["b@falcon.io".to_string()], Some(&first))
            .unwrap();
        assert_eq!(directory.write_count(), 2);
        assert_eq!(directory.snapshot()[0][columns::FIRST_SCANNER], "b@falcon.io");
    }

    #[test]
    fn roster_columns_are_not_writable() {
        let directory = falcon();
        let result = directory.write_range(
            "Falcon",
            ColumnRange::new(columns::MEMBER_EMAIL, columns::MEMBER_EMAIL),
            &["evil@falcon.io".to_string()],
            None,
        );
        assert!(matches!(result, Err(DirectoryError::InvalidWrite(_))));

        let short = directory.write_range(
            "Falcon",
            ColumnRange::new(columns::START_DISPLAY, columns::END_DISPLAY),
            &["only one".to_string()],
            None,
        );
        assert!(matches!(short, Err(DirectoryError::InvalidWrite(_))));
    }

    #[test]
    fn half_armed_rows_are_reported() {
        let directory = falcon();
        directory
            .write_range(
                "Falcon",
                ColumnRange::new(columns::START_AT, columns::START_AT),
                &["2026-01-09T00:00:00Z".to_string()],
                None,
            )
            .unwrap();
        let result = load_team(&directory, "Falcon");
        assert!(matches!(result, Err(ServiceError::CorruptRecord(_))));
    }

    #[test]
    fn corrupt_cells_are_not_reported_as_outages() {
        let mut timestamp_row = vec!["Falcon".to_string(), "a@falcon.io".to_string()];
        pad_row(&mut timestamp_row);
        timestamp_row[columns::START_AT] = "5:30 AM, 9th Jan 2026".to_string();
        timestamp_row[columns::END_AT] = "2026-01-10T00:00:00.000Z".to_string();
        let result = parse_team(&[timestamp_row], "Falcon");
        assert!(matches!(result, Err(ServiceError::CorruptRecord(_))));

        let mut status_row = vec!["Falcon".to_string(), "a@falcon.io".to_string()];
        pad_row(&mut status_row);
        status_row[columns::STATUS] = "Paused".to_string();
        let error = parse_team(&[status_row], "Falcon").unwrap_err();
        assert_eq!(error.reason(), "CORRUPT_RECORD");
        assert_eq!(
            actix_web::ResponseError::status_code(&error),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unavailable_store_surfaces_as_directory_error() {
        let directory = falcon();
        directory.set_unavailable(true, false);
        let result = find_team_for_email(&directory, "a@falcon.io");
        assert!(matches!(result, Err(ServiceError::DirectoryUnavailable(_))));
    }
}
