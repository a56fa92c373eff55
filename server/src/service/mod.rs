//! Business-logic layer: session authentication, adaptive progression, quiz
//! orchestration, tutor conversation, and analytics aggregation.
//! Each service depends on repositories and injected clients (`LlmClient`),
//! never on `HttpRequest`/Actix types directly, so they are testable in
//! isolation from the HTTP layer.

pub mod analytics_service;
pub mod progression_service;
pub mod quiz_orchestrator;
pub mod session_service;
pub mod tutor_service;

pub use analytics_service::AnalyticsService;
pub use progression_service::ProgressionService;
pub use quiz_orchestrator::QuizOrchestrator;
pub use session_service::SessionService;
pub use tutor_service::TutorService;
