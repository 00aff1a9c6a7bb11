use actix_web::{HttpResponse, Result, web};

use crate::models::*;
use crate::services::OverlayPlayer;

#[utoipa::path(
    get,
    path = "/overlay/state",
    tag = "overlay",
    responses(
        (status = 200, description = "What the overlay should render now", body = PlaybackSnapshot)
    )
)]
pub async fn overlay_state(player: web::Data<OverlayPlayer>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(player.snapshot())))
}

pub fn overlay_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/overlay").route("/state", web::get().to(overlay_state)));
}
