use crate::services::SettingsManager;
use actix_web::web::Data;
use actix_web::{HttpResponse, Responder};
use std::sync::Arc;
use tracing::error;

pub(crate) async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().finish()
}

pub(crate) async fn readiness_check(settings_manager: Data<Arc<SettingsManager>>) -> impl Responder {
    if let Err(error) = settings_manager.check_connection().await {
        error!(?error, "Readiness check failed");
        return HttpResponse::ServiceUnavailable().finish();
    }

    HttpResponse::Ok().finish()
}
