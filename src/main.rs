use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use tokio::sync::watch;

use gamecorn_alerts::{
    config::Config,
    external::create_synthesizers,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    storage::create_backend,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config =
        Config::from_toml().map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    // 队列存储
    let backend = create_backend(&config.queue)
        .await
        .context("Failed to open queue backend")?;
    let store = QueueStore::new(backend, config.queue.key.clone());
    log::info!(
        "Queue '{}' on {:?} backend",
        config.queue.key,
        config.queue.backend
    );

    let synthesizers = create_synthesizers(&config.speech, config.overlay.chars_per_second);

    // 创建服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);
    let auth_service = AuthService::new(jwt_service, config.auth.clone());
    let donation_service =
        DonationService::new(store.clone(), synthesizers.preview, config.donations.clone());
    // 接着上次运行留下的最大 id 分配
    if let Some(last) = donation_service
        .resume_ids()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read queue: {e}"))?
    {
        log::info!("Resuming donation ids after {last}");
    }
    let player = OverlayPlayer::new(
        store,
        synthesizers.overlay,
        PlaybackTimings::from(&config.overlay),
    );

    // 启动后台任务
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let player_task = tasks::spawn_all(player.clone(), shutdown_rx);

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(auth_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(donation_service.clone()))
            .app_data(web::Data::new(player.clone()))
            .configure(swagger_config)
            .configure(handlers::overlay_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::voice_config)
                    .configure(handlers::donation_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await;

    // 服务停止后再停播放器
    let _ = shutdown_tx.send(true);
    if let Err(e) = player_task.await {
        log::error!("Overlay player task failed: {e}");
    }

    server.context("HTTP server failed")
}
