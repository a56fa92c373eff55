//! # Adaptive English Platform — Core Learning Engine
//!
//! The server binary: session authentication, adaptive progression,
//! LLM-orchestrated quiz generation, tutor chat, and analytics over a
//! single PostgreSQL store.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     HTTP Layer (api/)                        │
//! │  routes → handlers → DTOs                                    │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                   Service Layer (service/)                    │
//! │  SessionService · ProgressionService · QuizOrchestrator ·     │
//! │  TutorService · AnalyticsService                              │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                Repository Layer (repository/)                 │
//! │  UserRepository · QuizRepository · SessionRepository ·        │
//! │  QaRepository · ChatLogRepository                             │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             ▼
//!                  PostgreSQL (document store, JSONB)
//! ```
//!
//! ## Configuration
//!
//! Environment variables are loaded via [`shared::config::AppConfig`]; see
//! that module for the full list. The LLM endpoint, session TTL, and
//! progression thresholds are all environment-driven rather than
//! hardcoded, so the fallback bank and level-transition behavior can be
//! tuned per deployment without a rebuild.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use shared::{auth::SessionValidator, auth::password::PasswordHasher, config::AppConfig, database, tracing_config};
use std::sync::Arc;
use tracing::info;

use server::api::routes;
use server::llm::HttpLlmClient;
use server::repository::{ChatLogRepository, QaRepository, QuizRepository, SessionRepository, UserRepository};
use server::service::analytics_service::AnalyticsService;
use server::service::progression_service::ProgressionService;
use server::service::quiz_orchestrator::QuizOrchestrator;
use server::service::session_service::SessionService;
use server::service::tutor_service::TutorService;
use server::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // ─────────────────────────────────────────────────────────────────
    // Step 1: Load configuration from environment
    // ─────────────────────────────────────────────────────────────────
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // ─────────────────────────────────────────────────────────────────
    // Step 2: Initialize structured logging
    // ─────────────────────────────────────────────────────────────────
    tracing_config::init_tracing(&config.service_name, config.is_production());

    info!(
        service = %config.service_name,
        host = %config.server.host,
        port = %config.server.port,
        "starting adaptive-english-platform server"
    );

    // ─────────────────────────────────────────────────────────────────
    // Step 3: Create PostgreSQL connection pool
    // ─────────────────────────────────────────────────────────────────
    let db_pool = database::create_pool(&config.database)
        .await
        .expect("Failed to create database pool");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // ─────────────────────────────────────────────────────────────────
    // Step 4: Instantiate repositories and services with dependencies
    // ─────────────────────────────────────────────────────────────────
    let user_repository = UserRepository::new(db_pool.clone());
    let quiz_repository = QuizRepository::new(db_pool.clone());
    let session_repository = SessionRepository::new(db_pool.clone());
    let qa_repository = QaRepository::new(db_pool.clone());
    let chat_log_repository = ChatLogRepository::new(db_pool.clone());

    let password_hasher = PasswordHasher::new();
    let llm_client: Arc<dyn server::llm::LlmClient> = Arc::new(HttpLlmClient::new(&config.llm));

    let session_service = SessionService::new(
        user_repository.clone(),
        session_repository,
        password_hasher,
        config.session.clone(),
    );
    let analytics_service = AnalyticsService::new(user_repository.clone(), quiz_repository.clone());
    let progression_service =
        ProgressionService::new(user_repository.clone(), quiz_repository.clone(), config.progression.clone());
    let quiz_orchestrator = QuizOrchestrator::new(
        user_repository.clone(),
        quiz_repository,
        llm_client.clone(),
        config.llm.clone(),
    );
    let tutor_service = TutorService::new(chat_log_repository, qa_repository, llm_client, config.llm.clone());

    // `SessionValidator` is resolved directly by the `AuthenticatedUser`
    // extractor, independent of `AppState`, so it is registered as its
    // own `app_data` entry.
    let session_validator: Arc<dyn SessionValidator> = Arc::new(session_service.clone());

    let app_state = web::Data::new(AppState {
        db_pool: db_pool.clone(),
        config: config.clone(),
        session_service,
        analytics_service,
        user_repository,
        quiz_orchestrator,
        progression_service,
        tutor_service,
    });
    let session_validator = web::Data::new(session_validator);

    // ─────────────────────────────────────────────────────────────────
    // Step 5: Configure and start HTTP server
    // ─────────────────────────────────────────────────────────────────
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    info!("server listening on {}:{}", server_host, server_port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(app_state.clone())
            .app_data(session_validator.clone())
            .configure(routes::configure)
    })
    .bind((server_host, server_port))?
    .run()
    .await
}
