// src/routes/health_routes.rs
use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().body("Timegate portal is running.\nScan in with your team account to start the clock.")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(health);
}
