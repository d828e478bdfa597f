// src/routes/dashboard_routes.rs
use crate::models::{DashboardResponse, ServiceError};
use crate::routes::locked_response;
use crate::services::access_gate::{check_access, AccessDecision};
use crate::services::countdown::Countdown;
use crate::state::AppState;
use crate::utils::{get_email_from_request, team_directory};
use actix_web::{get, web, HttpRequest, HttpResponse};
use log::{debug, info};

// Re-validate the team against the directory and report time left
#[get("/dashboard")]
async fn dashboard(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let email = get_email_from_request(&req)?;
    info!("🕒 Dashboard request from: {}", email);

    let team = team_directory::find_team_for_email(state.directory.as_ref(), &email)?;
    let now = state.clock.now();

    if let AccessDecision::Deny(reason) = check_access(&team, now) {
        info!("🔒 Team {} is locked ({:?})", team.team_name, reason);
        return Ok(locked_response(&team.team_name, reason.status()));
    }

    let end_time = match team.end_time {
        Some(end) => end,
        None => return Err(ServiceError::TimerNotStarted),
    };

    let remaining = Countdown::between(end_time, now);
    debug!("Team {} has {:?} left", team.team_name, remaining);

    Ok(HttpResponse::Ok().json(DashboardResponse {
        end_time_display: team
            .end_display
            .clone()
            .unwrap_or_else(|| state.display.format(end_time)),
        first_scanner: team.first_scanner.clone().unwrap_or_default(),
        team_name: team.team_name,
        end_time,
        remaining,
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(dashboard);
}
