use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use bookbridge::auth::AuthMiddleware;
use bookbridge::config::Config;
use bookbridge::credentials::PgCredentialStore;
use bookbridge::email::SmtpMailer;
use bookbridge::otp::{MemoryOtpStore, ResetCoordinator};
use bookbridge::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let mailer = SmtpMailer::from_config(&config).expect("Failed to build SMTP mailer");
    let coordinator = ResetCoordinator::new(
        Arc::new(MemoryOtpStore::new()),
        Arc::new(mailer),
        Arc::new(PgCredentialStore::new(pool.clone())),
    );

    log::info!("Starting BookBridge server at {}", config.server_url());

    HttpServer::new(move || {
        // Registration order is inside-out: CORS answers preflights first,
        // then the request log, then authentication.
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(coordinator.clone()))
            .wrap(AuthMiddleware)
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .service(routes::health::health)
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
