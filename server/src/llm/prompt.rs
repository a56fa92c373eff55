//! # Prompt Builder
//!
//! Constructs topic/level-aware prompts for quiz generation and the tutor
//! system preamble. Pure string assembly, no I/O, so it is unit-testable
//! without a live model — the same separation `ai-service::openai_client`
//! draws between building a prompt and calling the endpoint.

use crate::domain::{EnglishLevel, Question};

/// Everything the orchestrator knows about a single generation request,
/// gathered before the first LLM call.
pub struct QuizPromptSpec<'a> {
    pub level: EnglishLevel,
    /// One topic, or several when `Mixed` was requested and weak-area
    /// selection spread the count across topics.
    pub topics: &'a [String],
    pub num_questions: u32,
    /// The user's last `K` questions, passed so the model avoids
    /// repeating them.
    pub avoid: &'a [Question],
}

/// Builds the initial generation prompt.
pub fn build_quiz_prompt(spec: &QuizPromptSpec<'_>) -> String {
    let topics_line = spec.topics.join(", ");
    let reading_clause = if spec.topics.iter().any(|t| t == "Reading") {
        "\n\nIf any question's topic is \"Reading\", first write a single shared \
         passage (at least 3 sentences) and have every Reading question in this \
         set refer to it via a \"passage\" field containing that exact passage \
         text. Non-Reading questions must omit \"passage\" entirely."
    } else {
        ""
    };

    let avoid_block = if spec.avoid.is_empty() {
        String::new()
    } else {
        let mut block = String::from(
            "\n\nDo not repeat the meaning of any of these previously-asked questions:\n",
        );
        for q in spec.avoid {
            block.push_str("- ");
            block.push_str(&q.question);
            block.push('\n');
        }
        block
    };

    format!(
        "You are an English-language quiz generator for a {level} learner.\n\
         Generate exactly {count} multiple-choice questions on: {topics}.\n\
         Respond with ONLY a JSON array, no surrounding prose, where each \
         element has exactly these fields:\n\
         {{\"question\": string, \"options\": [string, string, string, string], \
         \"correct_answer\": string (must equal one of \"options\" verbatim), \
         \"explanation\": string (non-empty), \"topic\": string, \
         \"difficulty\": \"{level}\"}}\n\
         Every \"options\" array must have exactly 4 distinct entries.{reading}{avoid}",
        level = spec.level,
        count = spec.num_questions,
        topics = topics_line,
        reading = reading_clause,
        avoid = avoid_block,
    )
}

/// Builds a tightened retry prompt that shows the model its prior output
/// and the specific reason it was rejected.
pub fn build_retry_prompt(spec: &QuizPromptSpec<'_>, prior_output: &str, reason: &str) -> String {
    let base = build_quiz_prompt(spec);
    format!(
        "{base}\n\n\
         Your previous response was rejected for this reason: {reason}\n\
         Your previous response was:\n{prior_output}\n\n\
         Correct the issue and respond again with ONLY the JSON array, \
         following the schema exactly."
    )
}

/// Builds the tutor system preamble. `teacher_mode` extends it with
/// the requested level/focus when supplied.
pub fn build_tutor_system_prompt(teacher_mode: Option<(&str, &str)>) -> String {
    let base = "You are a friendly, patient English teacher. Keep paragraphs to \
                2-3 sentences. Give practical examples. Adapt your vocabulary to \
                the learner's level.";

    match teacher_mode {
        Some((level, focus)) => format!(
            "{base} The learner's current level is {level}; focus this \
             conversation on {focus}."
        ),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec<'a>(topics: &'a [String], avoid: &'a [Question]) -> QuizPromptSpec<'a> {
        QuizPromptSpec {
            level: EnglishLevel::Intermediate,
            topics,
            num_questions: 4,
            avoid,
        }
    }

    #[test]
    fn test_prompt_includes_count_and_level() {
        let topics = vec!["Grammar".to_string()];
        let prompt = build_quiz_prompt(&spec(&topics, &[]));
        assert!(prompt.contains("exactly 4"));
        assert!(prompt.contains("intermediate"));
        assert!(prompt.contains("Grammar"));
    }

    #[test]
    fn test_reading_clause_only_for_reading_topic() {
        let reading = vec!["Reading".to_string()];
        let grammar = vec!["Grammar".to_string()];
        assert!(build_quiz_prompt(&spec(&reading, &[])).contains("passage"));
        assert!(!build_quiz_prompt(&spec(&grammar, &[])).contains("shared passage"));
    }

    #[test]
    fn test_avoid_list_rendered() {
        let topics = vec!["Grammar".to_string()];
        let avoid = vec![Question {
            question: "What is the past tense of 'go'?".to_string(),
            options: vec!["went".into(), "goed".into(), "gone".into(), "going".into()],
            correct_answer: "went".to_string(),
            user_answer: None,
            is_correct: None,
            explanation: "...".to_string(),
            topic: "Grammar".to_string(),
            passage: None,
        }];
        let prompt = build_quiz_prompt(&spec(&topics, &avoid));
        assert!(prompt.contains("past tense of 'go'"));
    }

    #[test]
    fn test_retry_prompt_includes_reason_and_prior_output() {
        let topics = vec!["Grammar".to_string()];
        let prompt = build_retry_prompt(&spec(&topics, &[]), "[{\"bad\": true}]", "wrong shape");
        assert!(prompt.contains("wrong shape"));
        assert!(prompt.contains("bad"));
    }

    #[test]
    fn test_tutor_prompt_default() {
        let prompt = build_tutor_system_prompt(None);
        assert!(prompt.contains("patient English teacher"));
    }

    #[test]
    fn test_tutor_prompt_with_teacher_mode() {
        let prompt = build_tutor_system_prompt(Some(("beginner", "past tense")));
        assert!(prompt.contains("beginner"));
        assert!(prompt.contains("past tense"));
    }
}
