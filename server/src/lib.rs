//! # Adaptive English Platform — Core Learning Engine
//!
//! This crate implements the server side of the adaptive English-learning
//! platform: session authentication, the adaptive progression engine,
//! LLM-orchestrated quiz generation with a deterministic fallback, tutor
//! chat, analytics aggregation, and the HTTP surface tying them together.
//!
//! ```text
//! api/        - HTTP layer: DTOs, handlers, route configuration
//! service/    - Business logic: session, progression, orchestration, tutor, analytics
//! repository/ - Data access over PostgreSQL/JSONB
//! domain/     - Entities shared across layers
//! llm/        - LLM client, prompt construction, defensive response parsing
//! fallback/   - Curated question bank used when the LLM path fails
//! ```
//!
//! Clean Architecture layering, same as the rest of the platform's
//! microservices: `api` depends on `service`, `service` depends on
//! `repository`/`llm`/`fallback`, and `domain` sits underneath all of them.

pub mod api;
pub mod domain;
pub mod fallback;
pub mod llm;
pub mod repository;
pub mod service;

use sqlx::PgPool;

use service::analytics_service::AnalyticsService;
use service::progression_service::ProgressionService;
use service::quiz_orchestrator::QuizOrchestrator;
use service::session_service::SessionService;
use service::tutor_service::TutorService;

/// Shared application state injected into every request handler.
///
/// Wrapped in [`actix_web::web::Data`] at startup. `db_pool` is kept
/// alongside the services for the health-check endpoint, which pings the
/// store directly rather than through a service method.
pub struct AppState {
    pub db_pool: PgPool,
    pub config: shared::config::AppConfig,
    pub session_service: SessionService,
    pub analytics_service: AnalyticsService,
    pub user_repository: repository::UserRepository,
    pub quiz_orchestrator: QuizOrchestrator,
    pub progression_service: ProgressionService,
    pub tutor_service: TutorService,
}
