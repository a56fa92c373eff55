//! Domain entities and value objects for the adaptive-learning engine.

pub mod entities;

pub use entities::{
    ChatLogEntry, EnglishLevel, NewUser, QaEntry, Question, Quiz, QuizType, Session, TopicTally,
    User, MIXED_TOPIC, RECOGNIZED_TOPICS,
};
