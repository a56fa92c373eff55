//! # Output Parser
//!
//! Defensive parsing of untrusted model text into structured [`Question`]s
//! ("Treat model text as untrusted. Parse defensively... reject rather
//! than coerce on semantic violations"). Tolerates surrounding prose and
//! markdown code fences; rejects (never repairs) structurally or
//! semantically invalid output.

use crate::domain::{EnglishLevel, Question, RECOGNIZED_TOPICS};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("model response contained no JSON array")]
    NoJsonFound,
    #[error("model response was not valid JSON: {0}")]
    MalformedJson(String),
    #[error("expected {expected} questions, found {found}")]
    WrongCount { expected: usize, found: usize },
    #[error("question {index} has {count} options, expected exactly 4")]
    WrongOptionCount { index: usize, count: usize },
    #[error("question {index} has duplicate options")]
    DuplicateOptions { index: usize },
    #[error("question {index}'s correct_answer is not among its options")]
    AnswerNotInOptions { index: usize },
    #[error("question {index} has an empty explanation")]
    EmptyExplanation { index: usize },
    #[error("question {index} has an unrecognized topic: {topic}")]
    UnrecognizedTopic { index: usize, topic: String },
    #[error("question {index}'s difficulty does not match the requested level")]
    DifficultyMismatch { index: usize },
    #[error("Reading question {index} is missing a shared passage")]
    MissingPassage { index: usize },
    #[error("Reading questions in this set do not share one passage")]
    InconsistentPassage,
}

/// Raw shape accepted from the model, before validation. All fields are
/// required to exist but are validated for content afterward — parsing is
/// total, no panics on missing keys.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
    topic: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    passage: Option<String>,
}

/// Strips a ```json ... ``` or ``` ... ``` fence if the whole response is
/// wrapped in one, then locates the outermost JSON array by bracket
/// counting (ignoring brackets inside string literals), tolerating leading
/// or trailing prose around it.
fn extract_json_array(raw: &str) -> Result<&str, ParseError> {
    let trimmed = raw.trim();

    let unfenced = if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        trimmed
    };

    let start = unfenced.find('[').ok_or(ParseError::NoJsonFound)?;

    let bytes = unfenced.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }

    let end = end.ok_or(ParseError::NoJsonFound)?;
    Ok(&unfenced[start..=end])
}

/// Removes trailing commas before a closing bracket/brace, a common local-
/// model quirk that `serde_json` otherwise rejects outright.
fn strip_trailing_commas(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let bytes: Vec<char> = json.chars().collect();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in bytes.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            continue;
        }
        if c == ',' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_whitespace() {
                j += 1;
            }
            if j < bytes.len() && (bytes[j] == ']' || bytes[j] == '}') {
                continue;
            }
        }
        out.push(c);
    }

    out
}

/// Parses and validates a raw model completion: `expected_count` items,
/// each structurally and semantically valid for `level`. Returns the
/// first violation found.
pub fn parse_and_validate(
    raw: &str,
    expected_count: usize,
    level: EnglishLevel,
) -> Result<Vec<Question>, ParseError> {
    let array_slice = extract_json_array(raw)?;
    let cleaned = strip_trailing_commas(array_slice);

    let raw_questions: Vec<RawQuestion> =
        serde_json::from_str(&cleaned).map_err(|e| ParseError::MalformedJson(e.to_string()))?;

    if raw_questions.len() != expected_count {
        return Err(ParseError::WrongCount {
            expected: expected_count,
            found: raw_questions.len(),
        });
    }

    let mut shared_passage: Option<String> = None;
    let mut questions = Vec::with_capacity(raw_questions.len());

    for (index, raw_q) in raw_questions.into_iter().enumerate() {
        if raw_q.options.len() != 4 {
            return Err(ParseError::WrongOptionCount {
                index,
                count: raw_q.options.len(),
            });
        }

        let unique: HashSet<&str> = raw_q.options.iter().map(String::as_str).collect();
        if unique.len() != raw_q.options.len() {
            return Err(ParseError::DuplicateOptions { index });
        }

        if !raw_q.options.contains(&raw_q.correct_answer) {
            return Err(ParseError::AnswerNotInOptions { index });
        }

        if raw_q.explanation.trim().is_empty() {
            return Err(ParseError::EmptyExplanation { index });
        }

        if !RECOGNIZED_TOPICS.contains(&raw_q.topic.as_str()) {
            return Err(ParseError::UnrecognizedTopic {
                index,
                topic: raw_q.topic,
            });
        }

        if let Some(difficulty) = &raw_q.difficulty {
            if difficulty.to_lowercase() != level.to_string() {
                return Err(ParseError::DifficultyMismatch { index });
            }
        }

        if raw_q.topic == "Reading" {
            let passage = raw_q
                .passage
                .clone()
                .filter(|p| !p.trim().is_empty())
                .ok_or(ParseError::MissingPassage { index })?;

            match &shared_passage {
                None => shared_passage = Some(passage),
                Some(existing) if existing == &passage => {}
                Some(_) => return Err(ParseError::InconsistentPassage),
            }
        }

        questions.push(Question {
            question: raw_q.question,
            options: raw_q.options,
            correct_answer: raw_q.correct_answer,
            user_answer: None,
            is_correct: None,
            explanation: raw_q.explanation,
            topic: raw_q.topic,
            passage: raw_q.passage,
        });
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json(topic: &str) -> String {
        format!(
            r#"[{{"question":"Q1","options":["a","b","c","d"],"correct_answer":"a","explanation":"e1","topic":"{topic}","difficulty":"beginner"}},
               {{"question":"Q2","options":["a","b","c","d"],"correct_answer":"b","explanation":"e2","topic":"{topic}","difficulty":"beginner"}}]"#
        )
    }

    #[test]
    fn test_parses_clean_json() {
        let result = parse_and_validate(&valid_json("Grammar"), 2, EnglishLevel::Beginner);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 2);
    }

    #[test]
    fn test_tolerates_markdown_fence() {
        let fenced = format!("```json\n{}\n```", valid_json("Grammar"));
        let result = parse_and_validate(&fenced, 2, EnglishLevel::Beginner);
        assert!(result.is_ok());
    }

    #[test]
    fn test_tolerates_surrounding_prose() {
        let wrapped = format!("Sure, here are your questions:\n{}\nLet me know!", valid_json("Grammar"));
        let result = parse_and_validate(&wrapped, 2, EnglishLevel::Beginner);
        assert!(result.is_ok());
    }

    #[test]
    fn test_tolerates_trailing_commas() {
        let with_commas = r#"[{"question":"Q1","options":["a","b","c","d",],"correct_answer":"a","explanation":"e1","topic":"Grammar","difficulty":"beginner"},]"#;
        let result = parse_and_validate(with_commas, 1, EnglishLevel::Beginner);
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_wrong_count() {
        let result = parse_and_validate(&valid_json("Grammar"), 3, EnglishLevel::Beginner);
        assert_eq!(
            result.unwrap_err(),
            ParseError::WrongCount { expected: 3, found: 2 }
        );
    }

    #[test]
    fn test_rejects_wrong_option_count() {
        let bad = r#"[{"question":"Q1","options":["a","b","c"],"correct_answer":"a","explanation":"e","topic":"Grammar","difficulty":"beginner"}]"#;
        let result = parse_and_validate(bad, 1, EnglishLevel::Beginner);
        assert_eq!(result.unwrap_err(), ParseError::WrongOptionCount { index: 0, count: 3 });
    }

    #[test]
    fn test_rejects_duplicate_options() {
        let bad = r#"[{"question":"Q1","options":["a","a","c","d"],"correct_answer":"a","explanation":"e","topic":"Grammar","difficulty":"beginner"}]"#;
        let result = parse_and_validate(bad, 1, EnglishLevel::Beginner);
        assert_eq!(result.unwrap_err(), ParseError::DuplicateOptions { index: 0 });
    }

    #[test]
    fn test_rejects_answer_not_in_options() {
        let bad = r#"[{"question":"Q1","options":["a","b","c","d"],"correct_answer":"z","explanation":"e","topic":"Grammar","difficulty":"beginner"}]"#;
        let result = parse_and_validate(bad, 1, EnglishLevel::Beginner);
        assert_eq!(result.unwrap_err(), ParseError::AnswerNotInOptions { index: 0 });
    }

    #[test]
    fn test_rejects_unrecognized_topic() {
        let bad = r#"[{"question":"Q1","options":["a","b","c","d"],"correct_answer":"a","explanation":"e","topic":"Math","difficulty":"beginner"}]"#;
        let result = parse_and_validate(bad, 1, EnglishLevel::Beginner);
        assert!(matches!(result.unwrap_err(), ParseError::UnrecognizedTopic { .. }));
    }

    #[test]
    fn test_rejects_empty_explanation() {
        let bad = r#"[{"question":"Q1","options":["a","b","c","d"],"correct_answer":"a","explanation":"   ","topic":"Grammar","difficulty":"beginner"}]"#;
        let result = parse_and_validate(bad, 1, EnglishLevel::Beginner);
        assert_eq!(result.unwrap_err(), ParseError::EmptyExplanation { index: 0 });
    }

    #[test]
    fn test_rejects_difficulty_mismatch() {
        let bad = r#"[{"question":"Q1","options":["a","b","c","d"],"correct_answer":"a","explanation":"e","topic":"Grammar","difficulty":"advanced"}]"#;
        let result = parse_and_validate(bad, 1, EnglishLevel::Beginner);
        assert_eq!(result.unwrap_err(), ParseError::DifficultyMismatch { index: 0 });
    }

    #[test]
    fn test_reading_requires_passage() {
        let bad = r#"[{"question":"Q1","options":["a","b","c","d"],"correct_answer":"a","explanation":"e","topic":"Reading","difficulty":"beginner"}]"#;
        let result = parse_and_validate(bad, 1, EnglishLevel::Beginner);
        assert_eq!(result.unwrap_err(), ParseError::MissingPassage { index: 0 });
    }

    #[test]
    fn test_reading_passages_must_match_across_set() {
        let bad = r#"[
            {"question":"Q1","options":["a","b","c","d"],"correct_answer":"a","explanation":"e","topic":"Reading","difficulty":"beginner","passage":"Passage one about dogs."},
            {"question":"Q2","options":["a","b","c","d"],"correct_answer":"a","explanation":"e","topic":"Reading","difficulty":"beginner","passage":"A totally different passage."}
        ]"#;
        let result = parse_and_validate(bad, 2, EnglishLevel::Beginner);
        assert_eq!(result.unwrap_err(), ParseError::InconsistentPassage);
    }

    #[test]
    fn test_reading_passage_shared_is_accepted() {
        let good = r#"[
            {"question":"Q1","options":["a","b","c","d"],"correct_answer":"a","explanation":"e","topic":"Reading","difficulty":"beginner","passage":"Shared passage about cats and dogs living together peacefully."},
            {"question":"Q2","options":["a","b","c","d"],"correct_answer":"b","explanation":"e","topic":"Reading","difficulty":"beginner","passage":"Shared passage about cats and dogs living together peacefully."}
        ]"#;
        let result = parse_and_validate(good, 2, EnglishLevel::Beginner);
        assert!(result.is_ok());
        let questions = result.unwrap();
        assert!(questions.iter().all(|q| q.passage.is_some()));
    }

    #[test]
    fn test_rejects_non_json() {
        let result = parse_and_validate("I cannot help with that.", 1, EnglishLevel::Beginner);
        assert_eq!(result.unwrap_err(), ParseError::NoJsonFound);
    }
}
