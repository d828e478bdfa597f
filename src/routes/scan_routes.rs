// src/routes/scan_routes.rs
use crate::models::{ScanResponse, ServiceError};
use crate::routes::locked_response;
use crate::services::access_gate::{self, AccessDecision};
use crate::services::timer_engine;
use crate::state::AppState;
use crate::utils::{get_email_from_request, team_directory};
use actix_web::{post, web, HttpRequest, HttpResponse};
use log::{error, info};

// Start or resume the team's timer for the scanning member
#[post("/scan")]
async fn scan(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let email = get_email_from_request(&req)?;
    info!("📡 Scan from: {}", email);

    let directory = state.directory.as_ref();
    let team = team_directory::find_team_for_email(directory, &email).map_err(|e| {
        error!("❌ Scan lookup failed for {}: {}", email, e);
        e
    })?;

    // Server clock only; client timestamps are not trusted
    let now = state.clock.now();
    let timer = match timer_engine::arm_or_resume(directory, &state.display, &team.team_name, &email, now) {
        Ok(timer) => timer,
        Err(ServiceError::AlreadyClosed(status)) => return Ok(locked_response(&team.team_name, status)),
        Err(e) => return Err(e),
    };

    if let AccessDecision::Deny(reason) = access_gate::evaluate(timer.status, Some(timer.end_time), now) {
        info!("🔒 Team {} is locked ({:?}), denying {}", timer.team_name, reason, email);
        return Ok(locked_response(&timer.team_name, reason.status()));
    }

    info!(
        "✅ Team {} timer {} for {}, ends {}",
        timer.team_name,
        if timer.is_first_armer { "started" } else { "resumed" },
        email,
        timer.end_time
    );

    Ok(HttpResponse::Ok().json(ScanResponse {
        success: true,
        team_name: timer.team_name,
        start_time: timer.start_time,
        end_time: timer.end_time,
        start_time_display: timer.start_display,
        end_time_display: timer.end_display,
        first_scanner: timer.first_scanner,
        current_scanner: email,
        is_first_armer: timer.is_first_armer,
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(scan);
}
