//! # Request Handlers
//!
//! Thin HTTP bridges: decode, authenticate (via the [`AuthenticatedUser`]
//! extractor), delegate to a service, encode. No business logic lives here.

use actix_web::{web, HttpResponse};
use shared::{auth::AuthenticatedUser, errors::ApiError, validation::validate_request};

use crate::domain::{EnglishLevel, RECOGNIZED_TOPICS};
use crate::AppState;

use super::dto::{
    AskQuestionRequest, AskQuestionResponse, AuthResponse, ChangePasswordRequest,
    ChangeUsernameRequest, ChatRequest, ChatResponse, DeleteAccountRequest, EvaluateQuizRequest,
    EvaluationResponse, GenerateQuizRequest, GenerateQuizResponse, HealthCheckResponse,
    ModelInfoResponse, PerformanceDetailedResponse, PerformanceResponse, QuestionDto,
    QuizTopicsResponse, SigninRequest, SignupRequest, StatusResponse, SuccessResponse,
    TeacherChatRequest, TopicDto, UserProfileDto, ValidateResponse,
};
use crate::service::progression_service::{QuestionSubmission, QuizSubmission};
use crate::service::quiz_orchestrator::QuizOrchestrator;

// =============================================================================
// HEALTH / OPERATIONS
// =============================================================================

/// `GET /api/health-check/`: unauthenticated liveness probe that also
/// verifies store connectivity — it pings the store, not just the process.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match shared::database::health_check(&state.db_pool).await {
        Ok(()) => HttpResponse::Ok().json(HealthCheckResponse {
            status: "healthy",
            message: "service is operational".to_string(),
        }),
        Err(e) => HttpResponse::ServiceUnavailable().json(HealthCheckResponse {
            status: "unhealthy",
            message: e.to_string(),
        }),
    }
}

/// `GET /api/model-info/`: surfaces the active LLM endpoint configuration.
pub async fn model_info(state: web::Data<AppState>, _user: AuthenticatedUser) -> HttpResponse {
    let llm = &state.config.llm;
    HttpResponse::Ok().json(SuccessResponse::new(ModelInfoResponse {
        current_model: llm.model.clone(),
        base_url: llm.base_url.clone(),
        timeout: llm.timeout_seconds,
        temperature: llm.temperature,
        max_tokens: llm.max_tokens,
        available_models: vec![llm.model.clone()],
    }))
}

// =============================================================================
// AUTH
// =============================================================================

pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_request(&req)?;
    let session = state.session_service.register(&req.username, &req.password).await?;
    tracing::info!(username = %session.user.username, "user registered");
    Ok(HttpResponse::Ok().json(SuccessResponse::new(AuthResponse::from(session))))
}

pub async fn signin(
    state: web::Data<AppState>,
    body: web::Json<SigninRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_request(&req)?;
    let session = state.session_service.sign_in(&req.username, &req.password).await?;
    tracing::info!(username = %session.user.username, "user signed in");
    Ok(HttpResponse::Ok().json(SuccessResponse::new(AuthResponse::from(session))))
}

pub async fn logout(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;
    let token = shared::auth::extract_bearer_token(header)?;

    state.session_service.sign_out(token).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}

pub async fn validate(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(SuccessResponse::new(ValidateResponse {
        user_id: user.user_id,
        username: user.username,
        english_level: user.english_level,
        has_completed_first_quiz: user.has_completed_first_quiz,
    }))
}

pub async fn profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let profile = state.analytics_service.profile(user.user_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(UserProfileDto::from(profile))))
}

pub async fn user_profile_by_id(
    state: web::Data<AppState>,
    path: web::Path<uuid::Uuid>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let profile = state.analytics_service.profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(UserProfileDto::from(profile))))
}

pub async fn change_username(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ChangeUsernameRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_request(&req)?;
    state.user_repository.rename(user.user_id, &req.new_username).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}

pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_request(&req)?;
    state
        .session_service
        .change_password(user.user_id, &req.current_password, &req.new_password)
        .await?;
    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}

pub async fn delete_account(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<DeleteAccountRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_request(&req)?;
    state.session_service.delete_account(user.user_id, &req.password).await?;
    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}

// =============================================================================
// QUIZ
// =============================================================================

/// `GET /api/quiz-topics/`: the fixed topic catalog. `subtopics` is empty —
/// the data model carries no subtopic taxonomy beyond the five recognized
/// topics plus `Mixed`.
pub async fn quiz_topics(_user: AuthenticatedUser) -> HttpResponse {
    let topics = RECOGNIZED_TOPICS
        .iter()
        .map(|name| TopicDto {
            name: name.to_string(),
            subtopics: Vec::new(),
            levels: vec![EnglishLevel::Beginner, EnglishLevel::Intermediate, EnglishLevel::Advanced],
        })
        .collect();

    HttpResponse::Ok().json(QuizTopicsResponse { topics })
}

pub async fn generate_adaptive_quiz(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<GenerateQuizRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut questions = state
        .quiz_orchestrator
        .generate_quiz(user.user_id, body.topic.as_deref(), body.num_questions)
        .await?;
    QuizOrchestrator::shuffle_questions(&mut questions);

    let difficulty: EnglishLevel = user.english_level.parse().unwrap_or_default();

    let dto_questions = questions
        .into_iter()
        .map(|q| QuestionDto {
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
            topic: q.topic,
            difficulty,
            passage: q.passage,
        })
        .collect();

    Ok(HttpResponse::Ok().json(GenerateQuizResponse { questions: dto_questions }))
}

pub async fn evaluate_quiz(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<EvaluateQuizRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();

    let difficulty = req.difficulty.unwrap_or(EnglishLevel::Beginner);
    let quiz_type = req.quiz_type.unwrap_or(crate::domain::QuizType::Adaptive);

    let questions = req
        .quiz_data
        .questions
        .into_iter()
        .map(|q| QuestionSubmission {
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
            user_answer: q.user_answer,
            explanation: q.explanation,
            topic: q.topic,
            passage: q.passage,
        })
        .collect();

    let submission = QuizSubmission {
        user_id: user.user_id,
        quiz_type,
        topic: req.topic,
        difficulty,
        questions,
    };

    let result = state.progression_service.submit_quiz(submission).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(EvaluationResponse::from(result))))
}

// =============================================================================
// ANALYTICS
// =============================================================================

pub async fn user_performance(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let performance = state.analytics_service.performance(user.user_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(PerformanceResponse::from(performance))))
}

pub async fn user_performance_detailed(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let detailed = state.analytics_service.performance_detailed(user.user_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(PerformanceDetailedResponse::from(detailed))))
}

// =============================================================================
// TUTOR CONVERSATION
// =============================================================================

pub async fn chat(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse, ApiError> {
    let reply = state.tutor_service.chat(user.user_id, &body.conversation, None).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(ChatResponse { reply })))
}

pub async fn teacher_chat(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<TeacherChatRequest>,
) -> Result<HttpResponse, ApiError> {
    let reply = state
        .tutor_service
        .teacher_chat(user.user_id, &body.message, &body.user_level, &body.focus)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(ChatResponse { reply })))
}

pub async fn ask_question(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AskQuestionRequest>,
) -> Result<HttpResponse, ApiError> {
    let answer = state
        .tutor_service
        .ask_question(user.user_id, &body.question, body.context.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(AskQuestionResponse { answer })))
}
