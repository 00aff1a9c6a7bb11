use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::AppError;
use crate::middlewares::current_session;
use crate::models::*;
use crate::services::DonationService;

#[utoipa::path(
    get,
    path = "/api/v1/donations/settings",
    tag = "donation",
    responses(
        (status = 200, description = "Donation widget settings", body = DonationSettingsResponse)
    )
)]
pub async fn get_settings(donation_service: web::Data<DonationService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(donation_service.settings())))
}

#[utoipa::path(
    post,
    path = "/api/v1/donations",
    tag = "donation",
    request_body = CreateDonationRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Donation queued", body = DonationAccepted),
        (status = 400, description = "Invalid amount or empty message", body = ApiError),
        (status = 401, description = "Not logged in", body = ApiError),
        (status = 403, description = "Donations are disabled", body = ApiError)
    )
)]
pub async fn create_donation(
    donation_service: web::Data<DonationService>,
    req: HttpRequest,
    request: web::Json<CreateDonationRequest>,
) -> Result<HttpResponse> {
    if !donation_service.settings().enabled {
        return Ok(AppError::DonationsDisabled.error_response());
    }

    let session = current_session(&req);
    match donation_service
        .submit(session.as_ref(), request.into_inner())
        .await
    {
        Ok(accepted) => {
            let message = accepted.message.clone();
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(accepted, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/donations/preview",
    tag = "donation",
    request_body = PreviewRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Preview is being spoken", body = Utterance),
        (status = 400, description = "Empty message", body = ApiError),
        (status = 401, description = "Not logged in", body = ApiError),
        (status = 429, description = "Another preview is still playing", body = ApiError)
    )
)]
pub async fn preview_donation(
    donation_service: web::Data<DonationService>,
    req: HttpRequest,
    request: web::Json<PreviewRequest>,
) -> Result<HttpResponse> {
    let session = current_session(&req);
    match donation_service.preview(session.as_ref(), request.into_inner()) {
        Ok(utterance) => Ok(HttpResponse::Ok().json(ApiResponse::success(utterance))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/donations/queue",
    tag = "donation",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Pending and playing donations", body = [DonationRecord]),
        (status = 401, description = "Not logged in", body = ApiError)
    )
)]
pub async fn get_queue(donation_service: web::Data<DonationService>) -> Result<HttpResponse> {
    match donation_service.queue().await {
        Ok(records) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": records,
            "total": records.len()
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn donation_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/donations")
            .route("", web::post().to(create_donation))
            .route("/settings", web::get().to(get_settings))
            .route("/preview", web::post().to(preview_donation))
            .route("/queue", web::get().to(get_queue)),
    );
}
