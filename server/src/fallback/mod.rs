//! # Fallback Question Bank
//!
//! Static, curated questions indexed by `(topic, level)`, returned by the
//! quiz orchestrator when the LLM path cannot yield a valid quiz
//! within the retry budget. This path must always succeed when the bank is
//! non-empty for the requested level.

use crate::domain::{EnglishLevel, Question, MIXED_TOPIC, RECOGNIZED_TOPICS};

fn q(
    question: &str,
    options: [&str; 4],
    correct_answer: &str,
    explanation: &str,
    topic: &str,
) -> Question {
    Question {
        question: question.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        correct_answer: correct_answer.to_string(),
        user_answer: None,
        is_correct: None,
        explanation: explanation.to_string(),
        topic: topic.to_string(),
        passage: None,
    }
}

fn grammar_bank(level: EnglishLevel) -> Vec<Question> {
    match level {
        EnglishLevel::Beginner => vec![
            q(
                "She ___ to school every day.",
                ["go", "goes", "going", "gone"],
                "goes",
                "Third-person singular subjects take the -s form of the verb in the present simple.",
                "Grammar",
            ),
            q(
                "They ___ playing football now.",
                ["is", "am", "are", "be"],
                "are",
                "The plural subject 'they' takes the plural form 'are' of the verb 'to be'.",
                "Grammar",
            ),
            q(
                "I ___ a student.",
                ["am", "is", "are", "be"],
                "am",
                "The first-person singular pronoun 'I' pairs with 'am'.",
                "Grammar",
            ),
        ],
        EnglishLevel::Intermediate => vec![
            q(
                "By the time we arrived, the movie ___ already started.",
                ["has", "had", "have", "having"],
                "had",
                "The past perfect describes an action completed before another past action.",
                "Grammar",
            ),
            q(
                "If I ___ more time, I would learn another language.",
                ["have", "had", "has", "having"],
                "had",
                "The second conditional uses the past simple in the if-clause for hypothetical present situations.",
                "Grammar",
            ),
            q(
                "Neither the teacher nor the students ___ ready.",
                ["was", "were", "is", "be"],
                "were",
                "With 'neither...nor', the verb agrees with the noun closest to it — here, the plural 'students'.",
                "Grammar",
            ),
        ],
        EnglishLevel::Advanced => vec![
            q(
                "Had she studied harder, she ___ passed the exam.",
                ["would have", "will have", "would", "had"],
                "would have",
                "Third conditional: 'had + past participle' in the if-clause pairs with 'would have + past participle' in the result.",
                "Grammar",
            ),
            q(
                "Rarely ___ such a compelling argument.",
                ["I have seen", "have I seen", "I saw", "did I saw"],
                "have I seen",
                "Negative adverbials like 'rarely' at the start of a sentence trigger subject-auxiliary inversion.",
                "Grammar",
            ),
            q(
                "The report, ___ conclusions were widely disputed, was withdrawn.",
                ["which", "whose", "that", "who"],
                "whose",
                "'Whose' introduces a possessive relative clause referring back to 'the report'.",
                "Grammar",
            ),
        ],
    }
}

fn vocabulary_bank(level: EnglishLevel) -> Vec<Question> {
    match level {
        EnglishLevel::Beginner => vec![
            q(
                "Which word means the opposite of 'happy'?",
                ["glad", "sad", "joyful", "pleased"],
                "sad",
                "'Sad' is the antonym of 'happy'; the others are near-synonyms.",
                "Vocabulary",
            ),
            q(
                "A place where you buy bread is called a ___.",
                ["bakery", "library", "garage", "pharmacy"],
                "bakery",
                "A bakery specializes in bread and baked goods.",
                "Vocabulary",
            ),
            q(
                "Which word means 'very big'?",
                ["tiny", "huge", "narrow", "short"],
                "huge",
                "'Huge' describes something of very large size.",
                "Vocabulary",
            ),
        ],
        EnglishLevel::Intermediate => vec![
            q(
                "Her explanation was so ___ that nobody understood it.",
                ["concise", "convoluted", "clear", "brief"],
                "convoluted",
                "'Convoluted' means excessively complicated, matching 'nobody understood it'.",
                "Vocabulary",
            ),
            q(
                "The company had to ___ its workforce during the recession.",
                ["expand", "downsize", "promote", "celebrate"],
                "downsize",
                "'Downsize' means to reduce the number of employees, fitting a recession context.",
                "Vocabulary",
            ),
            q(
                "He felt a deep sense of ___ after losing the match.",
                ["elation", "disappointment", "curiosity", "gratitude"],
                "disappointment",
                "Losing a match typically produces disappointment, not the other listed emotions.",
                "Vocabulary",
            ),
        ],
        EnglishLevel::Advanced => vec![
            q(
                "The politician's speech was criticized for being ___, full of vague promises.",
                ["substantive", "platitudinous", "meticulous", "succinct"],
                "platitudinous",
                "'Platitudinous' describes speech full of trite, vague statements.",
                "Vocabulary",
            ),
            q(
                "Despite the ___ evidence, the jury remained unconvinced.",
                ["scant", "overwhelming", "negligible", "dubious"],
                "overwhelming",
                "'Overwhelming' evidence should have convinced the jury, creating the contrast implied by 'despite'.",
                "Vocabulary",
            ),
            q(
                "Her ___ remarks alienated several colleagues.",
                ["tactful", "caustic", "diplomatic", "gentle"],
                "caustic",
                "'Caustic' means sharply critical, which explains why colleagues were alienated.",
                "Vocabulary",
            ),
        ],
    }
}

fn tenses_bank(level: EnglishLevel) -> Vec<Question> {
    match level {
        EnglishLevel::Beginner => vec![
            q(
                "Yesterday, I ___ to the market.",
                ["go", "went", "goes", "going"],
                "went",
                "'Went' is the simple past form of 'go', matching the time marker 'yesterday'.",
                "Tenses",
            ),
            q(
                "She is ___ dinner right now.",
                ["cook", "cooks", "cooking", "cooked"],
                "cooking",
                "The present continuous ('is cooking') describes an action happening right now.",
                "Tenses",
            ),
            q(
                "We ___ visit our grandparents next weekend.",
                ["will", "did", "was", "were"],
                "will",
                "'Will' forms the simple future for a planned future action.",
                "Tenses",
            ),
        ],
        EnglishLevel::Intermediate => vec![
            q(
                "I ___ working here for five years.",
                ["am", "have been", "was", "will be"],
                "have been",
                "The present perfect continuous describes an action that started in the past and continues now.",
                "Tenses",
            ),
            q(
                "This time next year, she ___ her degree.",
                ["will have finished", "finishes", "finished", "has finished"],
                "will have finished",
                "The future perfect describes an action that will be completed before a specified future point.",
                "Tenses",
            ),
            q(
                "While I ___ TV, the phone rang.",
                ["watched", "was watching", "watch", "have watched"],
                "was watching",
                "The past continuous sets an ongoing background action interrupted by a simple past event.",
                "Tenses",
            ),
        ],
        EnglishLevel::Advanced => vec![
            q(
                "By next month, I ___ here for a decade.",
                ["will have been working", "will work", "have worked", "am working"],
                "will have been working",
                "The future perfect continuous emphasizes the duration of an action up to a future point.",
                "Tenses",
            ),
            q(
                "She wishes she ___ harder for the exam.",
                ["studied", "had studied", "has studied", "studies"],
                "had studied",
                "After 'wish' referring to the past, the past perfect expresses regret about an earlier action.",
                "Tenses",
            ),
            q(
                "Having finished the report, she ___ home.",
                ["went", "go", "had gone", "was going"],
                "went",
                "The perfect participle 'having finished' signals the action completed before the main clause's simple past.",
                "Tenses",
            ),
        ],
    }
}

fn pronunciation_bank(level: EnglishLevel) -> Vec<Question> {
    match level {
        EnglishLevel::Beginner => vec![
            q(
                "Which word rhymes with 'cat'?",
                ["cut", "hat", "cot", "cart"],
                "hat",
                "'Cat' and 'hat' share the same short-a vowel sound and final consonant.",
                "Pronunciation",
            ),
            q(
                "Which word has the stress on the first syllable?",
                ["be-LOW", "TA-ble", "a-BOUT", "a-GAIN"],
                "TA-ble",
                "'TABLE' is stressed on its first syllable; the others stress the second.",
                "Pronunciation",
            ),
            q(
                "Which of these words starts with a silent letter?",
                ["know", "now", "king", "kite"],
                "know",
                "The 'k' in 'know' is silent, unlike in 'king' or 'kite'.",
                "Pronunciation",
            ),
        ],
        EnglishLevel::Intermediate => vec![
            q(
                "Which word is stressed on the second syllable?",
                ["PHOto", "conTROL", "CAMera", "YELlow"],
                "conTROL",
                "'Control' places primary stress on its second syllable.",
                "Pronunciation",
            ),
            q(
                "Which pair of words are homophones?",
                ["flower / flour", "bear / bare", "both of these", "neither of these"],
                "both of these",
                "'Flower/flour' and 'bear/bare' are both homophone pairs — identical pronunciation, different spelling.",
                "Pronunciation",
            ),
            q(
                "Which word contains a diphthong in its vowel sound?",
                ["bit", "boat", "bat", "bet"],
                "boat",
                "'Boat' contains the diphthong /oʊ/, a glide between two vowel sounds.",
                "Pronunciation",
            ),
        ],
        EnglishLevel::Advanced => vec![
            q(
                "In connected speech, 'going to' is often reduced to:",
                ["gonna", "goin' to", "gointa", "gonta"],
                "gonna",
                "'Gonna' is the standard informal reduction of 'going to' in fast, connected speech.",
                "Pronunciation",
            ),
            q(
                "Which word's final '-ed' is pronounced as an extra syllable /ɪd/?",
                ["walked", "played", "wanted", "liked"],
                "wanted",
                "After a /t/ or /d/ sound, '-ed' adds an extra syllable, as in 'wanted' /ˈwɒntɪd/.",
                "Pronunciation",
            ),
            q(
                "Which sentence shows correct intonation for a yes/no question?",
                ["rising pitch at the end", "falling pitch at the end", "flat pitch throughout", "stress on every word"],
                "rising pitch at the end",
                "Yes/no questions in English typically end with rising intonation.",
                "Pronunciation",
            ),
        ],
    }
}

const READING_PASSAGE_BEGINNER: &str =
    "Maria works at a small bakery in the center of town. Every morning she wakes up \
     early to prepare fresh bread before the shop opens. Customers line up outside, \
     eager to buy warm loaves and pastries.";

const READING_PASSAGE_INTERMEDIATE: &str =
    "The introduction of remote work transformed how many companies operate. While \
     some employees reported higher productivity and better work-life balance, others \
     struggled with isolation and blurred boundaries between professional and personal \
     life. Employers are still experimenting with hybrid models to balance these \
     competing concerns.";

const READING_PASSAGE_ADVANCED: &str =
    "Economists have long debated whether automation ultimately destroys or creates \
     employment. Historical precedent suggests that while specific occupations are \
     rendered obsolete, new categories of work emerge to absorb displaced labor, though \
     the transition period can impose considerable hardship on the workers least able \
     to adapt their skills.";

fn reading_bank(level: EnglishLevel) -> Vec<Question> {
    let (passage, items): (&str, [(&str, [&str; 4], &str, &str); 3]) = match level {
        EnglishLevel::Beginner => (
            READING_PASSAGE_BEGINNER,
            [
                (
                    "Where does Maria work?",
                    ["a school", "a bakery", "a hospital", "a garage"],
                    "a bakery",
                    "The passage states Maria works at a bakery.",
                ),
                (
                    "What does Maria prepare every morning?",
                    ["fresh bread", "coffee", "newspapers", "flowers"],
                    "fresh bread",
                    "The passage says she prepares fresh bread before opening.",
                ),
                (
                    "Why do customers line up outside?",
                    ["to buy warm loaves and pastries", "to meet Maria", "to wait for the bus", "to see the town"],
                    "to buy warm loaves and pastries",
                    "The passage states customers are eager to buy warm loaves and pastries.",
                ),
            ],
        ),
        EnglishLevel::Intermediate => (
            READING_PASSAGE_INTERMEDIATE,
            [
                (
                    "What is one benefit of remote work mentioned in the passage?",
                    ["higher productivity", "lower salaries", "shorter commutes only", "fewer meetings only"],
                    "higher productivity",
                    "The passage cites higher productivity as a reported benefit.",
                ),
                (
                    "What challenge does the passage associate with remote work?",
                    ["isolation", "traffic jams", "office politics", "higher rent"],
                    "isolation",
                    "The passage mentions isolation as a struggle some employees reported.",
                ),
                (
                    "What are employers still experimenting with, according to the passage?",
                    ["hybrid models", "four-day weeks", "salary cuts", "new office furniture"],
                    "hybrid models",
                    "The passage says employers are experimenting with hybrid models.",
                ),
            ],
        ),
        EnglishLevel::Advanced => (
            READING_PASSAGE_ADVANCED,
            [
                (
                    "What do economists debate, according to the passage?",
                    ["whether automation destroys or creates employment", "the cost of raw materials", "tax policy", "interest rates"],
                    "whether automation destroys or creates employment",
                    "The opening sentence frames this exact debate.",
                ),
                (
                    "What does historical precedent suggest?",
                    ["new categories of work emerge", "automation always reduces total jobs", "wages always rise", "governments always intervene"],
                    "new categories of work emerge",
                    "The passage states new categories of work emerge to absorb displaced labor.",
                ),
                (
                    "Who bears the greatest hardship during the transition, per the passage?",
                    ["workers least able to adapt their skills", "company executives", "government regulators", "consumers"],
                    "workers least able to adapt their skills",
                    "The passage specifically names this group as bearing considerable hardship.",
                ),
            ],
        ),
    };

    items
        .into_iter()
        .map(|(question, options, correct, explanation)| Question {
            question: question.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.to_string(),
            user_answer: None,
            is_correct: None,
            explanation: explanation.to_string(),
            topic: "Reading".to_string(),
            passage: Some(passage.to_string()),
        })
        .collect()
}

/// All curated questions for a single `(topic, level)` cell. Returns an
/// empty vector for an unrecognized topic name.
fn bank_for(topic: &str, level: EnglishLevel) -> Vec<Question> {
    match topic {
        "Grammar" => grammar_bank(level),
        "Vocabulary" => vocabulary_bank(level),
        "Reading" => reading_bank(level),
        "Tenses" => tenses_bank(level),
        "Pronunciation" => pronunciation_bank(level),
        _ => Vec::new(),
    }
}

/// Selects up to `count` fallback questions for `topic`/`level`, deduplicated
/// against `avoid` by question text, padding with adjacent-level items from
/// the same topic (or, for `Mixed`, across all recognized topics) if the
/// primary cell runs short.
pub fn select_fallback_questions(
    topic: &str,
    level: EnglishLevel,
    count: usize,
    avoid: &[Question],
) -> Vec<Question> {
    let avoided: Vec<&str> = avoid.iter().map(|q| q.question.as_str()).collect();
    let topics: Vec<&str> = if topic == MIXED_TOPIC {
        RECOGNIZED_TOPICS.to_vec()
    } else {
        vec![topic]
    };

    let mut candidates: Vec<Question> = Vec::new();
    for t in &topics {
        candidates.extend(bank_for(t, level));
    }
    for t in &topics {
        if let Some(adjacent) = level.advance() {
            candidates.extend(bank_for(t, adjacent));
        }
        if let Some(adjacent) = level.demote() {
            candidates.extend(bank_for(t, adjacent));
        }
    }

    let mut selected: Vec<Question> = Vec::with_capacity(count);
    let mut seen: Vec<String> = Vec::new();

    for candidate in candidates.into_iter() {
        if selected.len() >= count {
            break;
        }
        if avoided.contains(&candidate.question.as_str()) {
            continue;
        }
        if seen.contains(&candidate.question) {
            continue;
        }
        seen.push(candidate.question.clone());
        selected.push(candidate);
    }

    // Last resort: repeat from the primary cell if the bank genuinely cannot
    // fill the request without repeats (still preferable to returning short).
    if selected.len() < count {
        let primary: Vec<Question> = topics.iter().flat_map(|t| bank_for(t, level)).collect();
        let mut cycle = primary.into_iter().cycle();
        while selected.len() < count {
            match cycle.next() {
                Some(question) => selected.push(question),
                None => break,
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_requested_count_for_known_topic() {
        let selected = select_fallback_questions("Grammar", EnglishLevel::Beginner, 3, &[]);
        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|q| q.topic == "Grammar"));
    }

    #[test]
    fn test_dedup_against_avoid_list() {
        let full = select_fallback_questions("Grammar", EnglishLevel::Beginner, 3, &[]);
        let selected = select_fallback_questions("Grammar", EnglishLevel::Beginner, 3, &full[..1]);
        assert!(!selected.iter().any(|q| q.question == full[0].question));
    }

    #[test]
    fn test_mixed_topic_draws_from_all_topics() {
        let selected = select_fallback_questions(MIXED_TOPIC, EnglishLevel::Intermediate, 5, &[]);
        assert_eq!(selected.len(), 5);
    }

    #[test]
    fn test_reading_questions_share_one_passage() {
        let selected = select_fallback_questions("Reading", EnglishLevel::Advanced, 3, &[]);
        let passages: Vec<&Option<String>> = selected.iter().map(|q| &q.passage).collect();
        assert!(passages.iter().all(|p| p.is_some()));
        assert!(passages.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_pads_with_adjacent_level_when_short() {
        let selected = select_fallback_questions("Grammar", EnglishLevel::Beginner, 8, &[]);
        assert_eq!(selected.len(), 8);
    }
}
