// src/routes/mod.rs
use actix_web::web;

pub mod dashboard_routes;
pub mod health_routes;
pub mod scan_routes;
pub mod submission_routes;

// Register every route group
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    health_routes::init_routes(cfg);
    scan_routes::init_routes(cfg);
    dashboard_routes::init_routes(cfg);
    submission_routes::init_routes(cfg);
}

// Locked view for teams the access gate turned away
pub(crate) fn locked_response(team_name: &str, status: crate::models::TeamStatus) -> actix_web::HttpResponse {
    actix_web::HttpResponse::Forbidden().json(crate::models::LockedResponse {
        locked: true,
        status,
        team_name: team_name.to_string(),
    })
}
