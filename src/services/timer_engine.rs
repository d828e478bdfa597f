// timegate-service/src/services/timer_engine.rs
use crate::models::{normalize_email, ServiceError, TeamRecord, TeamStatus};
use crate::utils::display_time::DisplayFormat;
use crate::utils::team_directory::{columns, load_team, ColumnRange, DirectoryError, TeamDirectory};
use chrono::{DateTime, Duration, DurationRound, SecondsFormat, Utc};
use log::{debug, info, warn};

pub const TIMER_HOURS: i64 = 24;

// Reads before giving up when other writers keep moving the revision
const MAX_ARM_ATTEMPTS: usize = 3;

// start_display ..= status on the team's first row
const ARM_RANGE: ColumnRange = ColumnRange::new(columns::START_DISPLAY, columns::STATUS);

/// A team's shared timer as seen by one requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub team_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_display: String,
    pub end_display: String,
    pub first_scanner: String,
    pub status: TeamStatus,
    pub is_first_armer: bool,
}

pub fn deadline_for(start: DateTime<Utc>) -> DateTime<Utc> {
    start + Duration::hours(TIMER_HOURS)
}

// Instants are stored at millisecond precision; arming truncates to match
pub fn stored_precision(instant: DateTime<Utc>) -> Result<DateTime<Utc>, ServiceError> {
    instant.duration_trunc(Duration::milliseconds(1)).map_err(|e| {
        warn!("Could not truncate {} to milliseconds: {}", instant, e);
        ServiceError::InternalServerError
    })
}

// Canonical instant text stored in the directory
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn resume(record: &TeamRecord, display: &DisplayFormat) -> Option<TimerState> {
    let (start_time, end_time) = match (record.start_time, record.end_time) {
        (Some(start), Some(end)) => (start, end),
        _ => return None,
    };

    Some(TimerState {
        team_name: record.team_name.clone(),
        start_time,
        end_time,
        start_display: record
            .start_display
            .clone()
            .unwrap_or_else(|| display.format(start_time)),
        end_display: record
            .end_display
            .clone()
            .unwrap_or_else(|| display.format(end_time)),
        first_scanner: record.first_scanner.clone().unwrap_or_default(),
        status: record.status,
        is_first_armer: false,
    })
}

/// Start the team's 24 hour clock, or return the one already running.
///
/// Arming is a single conditional write of start/end, first scanner and
/// `Active`, guarded by the revision read in the same attempt. Losing that race
/// means another member armed first, so the next read resumes their timer.
pub fn arm_or_resume(
    directory: &dyn TeamDirectory,
    display: &DisplayFormat,
    team_name: &str,
    requester_email: &str,
    now: DateTime<Utc>,
) -> Result<TimerState, ServiceError> {
    let requester = normalize_email(requester_email);

    for attempt in 1..=MAX_ARM_ATTEMPTS {
        let record = load_team(directory, team_name)?.ok_or(ServiceError::NotRegistered)?;

        if !record.has_member(&requester) {
            warn!("❌ {} is not on the roster of team {}", requester, team_name);
            return Err(ServiceError::NotRegistered);
        }

        if let Some(timer) = resume(&record, display) {
            debug!("Resuming timer for team {} (ends {})", team_name, timer.end_time);
            return Ok(timer);
        }

        if record.status.is_closed() {
            warn!("Team {} is {} without a timer, refusing to arm", team_name, record.status);
            return Err(ServiceError::AlreadyClosed(record.status));
        }

        let start_time = stored_precision(now)?;
        let end_time = deadline_for(start_time);
        let start_display = display.format(start_time);
        let end_display = display.format(end_time);

        let values = vec![
            start_display.clone(),
            end_display.clone(),
            format_instant(start_time),
            format_instant(end_time),
            requester.clone(),
            TeamStatus::Active.as_cell().to_string(),
        ];

        match directory.write_range(team_name, ARM_RANGE, &values, Some(&record.revision)) {
            Ok(_) => {
                info!("⏱️ Team {} armed by {}, deadline {}", team_name, requester, end_time);
                return Ok(TimerState {
                    team_name: team_name.to_string(),
                    start_time,
                    end_time,
                    start_display,
                    end_display,
                    first_scanner: requester,
                    status: TeamStatus::Active,
                    is_first_armer: true,
                });
            }
            Err(DirectoryError::Conflict { .. }) => {
                warn!(
                    "Arming race on team {} (attempt {}/{}), re-reading",
                    team_name, attempt, MAX_ARM_ATTEMPTS
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::DirectoryUnavailable(format!(
        "timer for team {} did not settle after {} attempts",
        team_name, MAX_ARM_ATTEMPTS
    )))
}
