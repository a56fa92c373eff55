//! # Route Configuration
//!
//! Binds every endpoint of its external interface to its handler. Protected
//! routes rely on the [`shared::auth::AuthenticatedUser`] extractor to
//! enforce authentication — there is no separate middleware layer guarding
//! a whole scope, since a handful of routes (`signup`, `signin`,
//! `health-check`) are deliberately public within the same `/api` scope.

use actix_web::web;

use super::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // ─── Unauthenticated ──────────────────────────────────────
            .route("/health-check/", web::get().to(handlers::health_check))
            .route("/auth/signup", web::post().to(handlers::signup))
            .route("/auth/signin", web::post().to(handlers::signin))
            // ─── Auth (protected) ─────────────────────────────────────
            .route("/auth/logout", web::post().to(handlers::logout))
            .route("/auth/validate", web::get().to(handlers::validate))
            .route("/auth/profile", web::get().to(handlers::profile))
            .route(
                "/auth/profile/username",
                web::put().to(handlers::change_username),
            )
            .route(
                "/auth/profile/password",
                web::put().to(handlers::change_password),
            )
            .route("/auth/profile", web::delete().to(handlers::delete_account))
            // ─── Quiz ──────────────────────────────────────────────────
            .route("/quiz-topics/", web::get().to(handlers::quiz_topics))
            .route(
                "/generate-adaptive-quiz/",
                web::post().to(handlers::generate_adaptive_quiz),
            )
            .route("/evaluate-quiz/", web::post().to(handlers::evaluate_quiz))
            // ─── Analytics ─────────────────────────────────────────────
            .route(
                "/user-profile/{user_id}",
                web::get().to(handlers::user_profile_by_id),
            )
            .route(
                "/user-performance/",
                web::get().to(handlers::user_performance),
            )
            .route(
                "/user-performance-detailed/",
                web::get().to(handlers::user_performance_detailed),
            )
            // ─── Tutor conversation ────────────────────────────────────
            .route("/chat/", web::post().to(handlers::chat))
            .route("/teacher-chat/", web::post().to(handlers::teacher_chat))
            .route("/ask-question/", web::post().to(handlers::ask_question))
            // ─── Operations ────────────────────────────────────────────
            .route("/model-info/", web::get().to(handlers::model_info)),
    );
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_route_configuration_compiles() {
        // Exercising this requires `actix_web::test`; see
        // `tests/` for handler-level integration coverage.
        let _configure = super::configure;
    }
}
