use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;

use crate::models::config::Config;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    debug: bool,
}

#[get("/health")]
pub async fn health(config: web::Data<Config>) -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok",
        debug: config.is_debug_mode(),
    })
}
