//! # Adaptive Progression Engine
//!
//! Scores a submitted quiz, updates a user's running aggregates, and
//! evaluates whether a level transition has been earned — all inside a
//! single store-side transaction so the quiz insert and the user's
//! aggregate update commit together under per-user serializability.
//!
//! Two scan-based formulas replace an incremental running-mean approach,
//! to guarantee [`ProgressionService::topic_progress`]
//! and the analytics aggregator can never drift apart, and so the
//! level-transition window naturally "resets" after a transition without a
//! separate cursor column (see `replay_level_window` below).

use std::collections::HashMap;

use shared::{config::ProgressionConfig, errors::ApiError};
use uuid::Uuid;

use crate::domain::{EnglishLevel, Question, Quiz, QuizType, TopicTally};
use crate::repository::{NewQuiz, QuizRepository, UserRepository};

/// Direction of a level transition, when one occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChangeType {
    Progression,
    Retrocession,
}

/// One answered question as submitted by the client for `POST /api/submit-quiz/`.
#[derive(Debug, Clone)]
pub struct QuestionSubmission {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub user_answer: String,
    pub explanation: String,
    pub topic: String,
    pub passage: Option<String>,
}

/// Inputs to `submit_quiz`, after DTO validation has confirmed shape.
#[derive(Debug, Clone)]
pub struct QuizSubmission {
    pub user_id: Uuid,
    pub quiz_type: QuizType,
    pub topic: String,
    pub difficulty: EnglishLevel,
    pub questions: Vec<QuestionSubmission>,
}

/// Outcome of a successful submission (score, updated level,
/// progress-by-topic, and whether this level changed as a result).
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub quiz: Quiz,
    pub score: i32,
    pub previous_level: EnglishLevel,
    pub new_level: EnglishLevel,
    pub level_change_type: Option<LevelChangeType>,
    pub level_change_message: Option<String>,
    pub total_quizzes: i64,
    pub average_score: f64,
    pub progress: HashMap<String, f64>,
    pub has_completed_first_quiz: bool,
}

#[derive(Clone)]
pub struct ProgressionService {
    users: UserRepository,
    quizzes: QuizRepository,
    config: ProgressionConfig,
}

impl ProgressionService {
    pub fn new(users: UserRepository, quizzes: QuizRepository, config: ProgressionConfig) -> Self {
        Self {
            users,
            quizzes,
            config,
        }
    }

    /// `submit_quiz`: grades every answer by string equality against
    /// `correct_answer` (case-sensitive, matching the options text the
    /// question was issued with), recomputes the quiz score, persists the
    /// quiz and updated aggregates atomically, and evaluates a level
    /// transition against the user's full score history.
    pub async fn submit_quiz(&self, submission: QuizSubmission) -> Result<SubmissionResult, ApiError> {
        Self::validate_submission(&submission)?;

        let graded = Self::grade_questions(&submission.questions);
        let score = Self::score_percent(&graded);
        let topic_performance = Self::tally_by_topic(&graded);

        let mut tx = self.quizzes.begin().await?;

        let user = UserRepository::find_by_id_for_update(&mut tx, submission.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("user:{}", submission.user_id),
            })?;

        let new_quiz = NewQuiz {
            user_id: submission.user_id,
            quiz_type: submission.quiz_type,
            topic: submission.topic.clone(),
            difficulty: submission.difficulty,
            score,
            questions: graded,
            topic_performance,
        };
        let quiz = QuizRepository::insert_in_tx(&mut tx, new_quiz).await?;

        // The transaction sees its own writes, so this already includes the
        // quiz just inserted above — do not also push it onto the history.
        let history = QuizRepository::find_by_user_in_tx(&mut tx, submission.user_id).await?;

        let total_quizzes = history.len() as i64;
        let average_score = Self::mean_score(&history);
        let progress = Self::topic_progress(&history);
        let previous_level = user.english_level;
        let new_level = self.evaluate_level_transition(previous_level, &history);
        let has_completed_first_quiz = true;

        let level_change_type = if new_level > previous_level {
            Some(LevelChangeType::Progression)
        } else if new_level < previous_level {
            Some(LevelChangeType::Retrocession)
        } else {
            None
        };
        let level_change_message = level_change_type.map(|change| match change {
            LevelChangeType::Progression => format!(
                "Congratulations! You've advanced from {previous_level} to {new_level}."
            ),
            LevelChangeType::Retrocession => format!(
                "Your level has been adjusted from {previous_level} to {new_level} based on recent performance."
            ),
        });

        UserRepository::apply_quiz_submission_in_tx(
            &mut tx,
            submission.user_id,
            total_quizzes,
            average_score,
            &progress,
            has_completed_first_quiz,
            new_level,
        )
        .await?;

        tx.commit().await.map_err(ApiError::StoreUnavailable)?;

        Ok(SubmissionResult {
            quiz,
            score,
            previous_level,
            new_level,
            level_change_type,
            level_change_message,
            total_quizzes,
            average_score,
            progress,
            has_completed_first_quiz,
        })
    }

    /// structural validation ("invalid_quiz_structure"): every
    /// question must carry exactly 4 options, a non-empty `user_answer`,
    /// and a `correct_answer` that is one of its own options.
    fn validate_submission(submission: &QuizSubmission) -> Result<(), ApiError> {
        if submission.questions.is_empty() {
            return Err(ApiError::InvalidInput {
                message: "quiz must contain at least one question".to_string(),
            });
        }

        for q in &submission.questions {
            if q.options.len() != 4 {
                return Err(ApiError::InvalidInput {
                    message: "each question must have exactly 4 options".to_string(),
                });
            }
            if !q.options.contains(&q.correct_answer) {
                return Err(ApiError::InvalidInput {
                    message: "correct_answer must be one of the question's options".to_string(),
                });
            }
            if q.user_answer.trim().is_empty() {
                return Err(ApiError::InvalidInput {
                    message: "user_answer must not be blank".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Grades each submitted question by string equality between
    /// `user_answer` and `correct_answer` — the server recomputes
    /// `is_correct` rather than trusting any client-supplied value.
    fn grade_questions(questions: &[QuestionSubmission]) -> Vec<Question> {
        questions
            .iter()
            .map(|q| {
                let is_correct = q.user_answer == q.correct_answer;
                Question {
                    question: q.question.clone(),
                    options: q.options.clone(),
                    correct_answer: q.correct_answer.clone(),
                    user_answer: Some(q.user_answer.clone()),
                    is_correct: Some(is_correct),
                    explanation: q.explanation.clone(),
                    topic: q.topic.clone(),
                    passage: q.passage.clone(),
                }
            })
            .collect()
    }

    /// `round(100 * correct / total)`, `Quiz.score`.
    fn score_percent(graded: &[Question]) -> i32 {
        let total = graded.len() as f64;
        let correct = graded.iter().filter(|q| q.is_correct == Some(true)).count() as f64;
        (100.0 * correct / total).round() as i32
    }

    fn tally_by_topic(graded: &[Question]) -> HashMap<String, TopicTally> {
        let mut tallies: HashMap<String, TopicTally> = HashMap::new();
        for q in graded {
            let entry = tallies.entry(q.topic.clone()).or_default();
            entry.total += 1;
            if q.is_correct == Some(true) {
                entry.correct += 1;
            }
        }
        tallies
    }

    fn mean_score(history: &[Quiz]) -> f64 {
        if history.is_empty() {
            return 0.0;
        }
        let sum: i64 = history.iter().map(|q| q.score as i64).sum();
        sum as f64 / history.len() as f64
    }

    /// `progress[t] = 100 * sum(correct in t) / sum(total in t)` across the
    /// user's full quiz history, scanned fresh each call. This is the single
    /// formula shared with [`crate::service::analytics_service::AnalyticsService`],
    /// so the two endpoints can never disagree about a topic's percentage —
    /// an incremental running update risked drifting from a from-scratch
    /// recomputation over a long history, so there is no such update here.
    pub fn topic_progress(history: &[Quiz]) -> HashMap<String, f64> {
        let mut totals: HashMap<String, (i32, i32)> = HashMap::new();

        for quiz in history {
            for (topic, tally) in quiz.topic_performance.0.iter() {
                let entry = totals.entry(topic.clone()).or_insert((0, 0));
                entry.0 += tally.correct;
                entry.1 += tally.total;
            }
        }

        totals
            .into_iter()
            .map(|(topic, (correct, total))| {
                let pct = if total == 0 {
                    0.0
                } else {
                    100.0 * correct as f64 / total as f64
                };
                (topic, pct)
            })
            .collect()
    }

    /// level transition: evaluated against the most recent
    /// `min_quizzes_for_level_change` scores *since the last transition*.
    /// [`Self::replay_level_window`] derives that window's start index by
    /// replaying the full history forward rather than persisting a cursor,
    /// so a transition's window always restarts empty immediately after.
    fn evaluate_level_transition(&self, current_level: EnglishLevel, history: &[Quiz]) -> EnglishLevel {
        let min_quizzes = self.config.min_quizzes_for_level_change as usize;
        let window_start = Self::replay_level_window(
            history,
            min_quizzes,
            self.config.level_up_threshold,
            self.config.level_down_threshold,
        );
        let window = &history[window_start..];

        if window.len() < min_quizzes {
            return current_level;
        }

        let recent = &window[window.len() - min_quizzes..];
        let mean: f64 = recent.iter().map(|q| q.score as f64).sum::<f64>() / recent.len() as f64;

        if mean >= self.config.level_up_threshold {
            current_level.advance().unwrap_or(current_level)
        } else if mean <= self.config.level_down_threshold {
            current_level.demote().unwrap_or(current_level)
        } else {
            current_level
        }
    }

    /// Replays the full quiz history forward, re-running the same
    /// up/down/no-op decision `evaluate_level_transition` makes, to find the
    /// index right after the most recent transition. Every quiz from that
    /// index onward belongs to the "current" window; everything before it
    /// contributed to a level the user has since left.
    ///
    /// Pure and database-free so it is exercised directly in unit tests
    /// rather than only through `submit_quiz`'s transaction.
    fn replay_level_window(
        history: &[Quiz],
        min_quizzes: usize,
        level_up_threshold: f64,
        level_down_threshold: f64,
    ) -> usize {
        if history.is_empty() || min_quizzes == 0 {
            return 0;
        }

        let mut window_start = 0usize;
        let mut level = history[0].difficulty;

        for i in 0..history.len() {
            let window = &history[window_start..=i];
            if window.len() < min_quizzes {
                continue;
            }
            let recent = &window[window.len() - min_quizzes..];
            let mean: f64 =
                recent.iter().map(|q| q.score as f64).sum::<f64>() / recent.len() as f64;

            let advanced = mean >= level_up_threshold && level.advance().is_some();
            let demoted = mean <= level_down_threshold && level.demote().is_some();

            if advanced {
                level = level.advance().unwrap();
                window_start = i + 1;
            } else if demoted {
                level = level.demote().unwrap();
                window_start = i + 1;
            }
        }

        window_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    fn quiz(score: i32, difficulty: EnglishLevel) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            quiz_type: QuizType::Adaptive,
            topic: "Grammar".to_string(),
            difficulty,
            score,
            questions: Json(vec![]),
            topic_performance: Json(HashMap::from([(
                "Grammar".to_string(),
                TopicTally {
                    correct: score / 25,
                    total: 4,
                },
            )])),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_score_percent_rounds() {
        let graded = vec![
            Question {
                question: "q".into(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "a".into(),
                user_answer: Some("a".into()),
                is_correct: Some(true),
                explanation: "e".into(),
                topic: "Grammar".into(),
                passage: None,
            },
            Question {
                question: "q2".into(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "a".into(),
                user_answer: Some("b".into()),
                is_correct: Some(false),
                explanation: "e".into(),
                topic: "Grammar".into(),
                passage: None,
            },
            Question {
                question: "q3".into(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer: "a".into(),
                user_answer: Some("a".into()),
                is_correct: Some(true),
                explanation: "e".into(),
                topic: "Grammar".into(),
                passage: None,
            },
        ];
        assert_eq!(ProgressionService::score_percent(&graded), 67);
    }

    #[test]
    fn test_grade_questions_uses_string_equality() {
        let submitted = vec![QuestionSubmission {
            question: "q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "b".into(),
            user_answer: "b".into(),
            explanation: "e".into(),
            topic: "Vocabulary".into(),
            passage: None,
        }];
        let graded = ProgressionService::grade_questions(&submitted);
        assert_eq!(graded[0].is_correct, Some(true));
    }

    #[test]
    fn test_topic_progress_aggregates_across_quizzes() {
        let mut q1 = quiz(100, EnglishLevel::Beginner);
        q1.topic_performance = Json(HashMap::from([(
            "Grammar".to_string(),
            TopicTally { correct: 4, total: 4 },
        )]));
        let mut q2 = quiz(50, EnglishLevel::Beginner);
        q2.topic_performance = Json(HashMap::from([(
            "Grammar".to_string(),
            TopicTally { correct: 2, total: 4 },
        )]));

        let progress = ProgressionService::topic_progress(&[q1, q2]);
        assert_eq!(progress.get("Grammar"), Some(&75.0));
    }

    #[test]
    fn test_replay_window_resets_after_transition() {
        let history = vec![
            quiz(80, EnglishLevel::Beginner),
            quiz(80, EnglishLevel::Beginner),
            quiz(80, EnglishLevel::Beginner),
            quiz(40, EnglishLevel::Intermediate),
        ];
        // After 3 quizzes at 80 the window advances Beginner -> Intermediate
        // and restarts at index 3: only the trailing 40 belongs to it.
        let start = ProgressionService::replay_level_window(&history, 3, 75.0, 50.0);
        assert_eq!(start, 3);
    }

    #[test]
    fn test_replay_window_empty_history() {
        assert_eq!(ProgressionService::replay_level_window(&[], 3, 75.0, 50.0), 0);
    }

    #[test]
    fn test_mean_score_empty() {
        assert_eq!(ProgressionService::mean_score(&[]), 0.0);
    }

    /// A `PgPool` that parses its URL but never actually connects — enough
    /// to construct a `ProgressionService` for testing the pure
    /// level-transition logic, which never touches the pool.
    fn test_service(config: ProgressionConfig) -> ProgressionService {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/test")
            .expect("lazy pool construction does not connect");
        ProgressionService::new(UserRepository::new(pool.clone()), QuizRepository::new(pool), config)
    }

    fn test_config() -> ProgressionConfig {
        ProgressionConfig {
            level_up_threshold: 75.0,
            level_down_threshold: 50.0,
            min_quizzes_for_level_change: 3,
        }
    }

    #[test]
    fn test_evaluate_level_transition_advances_on_high_mean() {
        let service = test_service(test_config());
        let history = vec![
            quiz(85, EnglishLevel::Intermediate),
            quiz(90, EnglishLevel::Intermediate),
            quiz(95, EnglishLevel::Intermediate),
        ];
        let new_level = service.evaluate_level_transition(EnglishLevel::Intermediate, &history);
        assert_eq!(new_level, EnglishLevel::Advanced);
        assert!(new_level > EnglishLevel::Intermediate);
    }

    #[test]
    fn test_evaluate_level_transition_demotes_on_low_mean() {
        let service = test_service(test_config());
        let history = vec![
            quiz(45, EnglishLevel::Advanced),
            quiz(40, EnglishLevel::Advanced),
            quiz(40, EnglishLevel::Advanced),
        ];
        let new_level = service.evaluate_level_transition(EnglishLevel::Advanced, &history);
        assert_eq!(new_level, EnglishLevel::Intermediate);
        assert!(new_level < EnglishLevel::Advanced);
    }
}
