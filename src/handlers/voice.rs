use actix_web::{HttpResponse, Result, web};

use crate::models::*;

#[utoipa::path(
    get,
    path = "/api/v1/voices",
    tag = "voice",
    responses(
        (status = 200, description = "Voice catalog", body = [VoiceResponse])
    )
)]
pub async fn list_voices() -> Result<HttpResponse> {
    let voices: Vec<VoiceResponse> = voice_catalog().iter().map(VoiceResponse::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(voices)))
}

pub fn voice_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/voices", web::get().to(list_voices));
}
