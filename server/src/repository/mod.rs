//! Data-access layer. Each repository wraps a `PgPool` and exposes typed,
//! parameterized queries over one collection.

pub mod chat_log_repository;
pub mod qa_repository;
pub mod quiz_repository;
pub mod session_repository;
pub mod user_repository;

pub use chat_log_repository::ChatLogRepository;
pub use qa_repository::QaRepository;
pub use quiz_repository::{NewQuiz, QuizRepository};
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;
