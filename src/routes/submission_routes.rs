// src/routes/submission_routes.rs
use crate::models::{ServiceError, SubmitRequest, SubmitResponse};
use crate::services::submission_recorder;
use crate::state::AppState;
use crate::utils::{get_email_from_request, team_directory};
use actix_web::{post, web, HttpRequest, HttpResponse};
use log::{error, info};

// Submit the team's answers and close the team
#[post("/submit")]
async fn submit_answers(
    req: HttpRequest,
    state: web::Data<AppState>,
    data: web::Json<SubmitRequest>,
) -> Result<HttpResponse, ServiceError> {
    let email = get_email_from_request(&req)?;
    info!("📝 Submission from: {}", email);

    let directory = state.directory.as_ref();
    let team = team_directory::find_team_for_email(directory, &email)?;

    // The team comes from the verified identity; a named team must agree with it
    if let Some(claimed) = data.team_name.as_deref() {
        if claimed.trim() != team.team_name {
            error!("❌ {} tried to submit for team {} but belongs to {}", email, claimed, team.team_name);
            return Err(ServiceError::NotRegistered);
        }
    }

    let receipt = submission_recorder::submit(directory, &team.team_name, &data.answers, state.clock.now())
        .map_err(|e| {
            error!("❌ Submission for team {} rejected: {}", team.team_name, e);
            e
        })?;

    info!("✅ Answers recorded for team {}", receipt.team_name);

    Ok(HttpResponse::Ok().json(SubmitResponse {
        success: true,
        answers_digest: receipt.answers_digest,
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_answers);
}
