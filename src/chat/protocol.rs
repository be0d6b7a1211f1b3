//! Wire protocol — inbound client messages and outbound bot messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::{AssessmentOutcome, Classification, QuestionDefinition, RecommendationSet};

/// Message from client → server.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    pub message: String,
}

/// Questionnaire progress attached to every question message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based number of the question being asked.
    pub current: usize,
    pub total: usize,
}

/// Message from server → client, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Free-text bot reply.
    Message {
        sender: String,
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// Typing indicator, sent before every substantive reply.
    Typing { sender: String },
    /// A questionnaire prompt with its selectable options.
    Question {
        sender: String,
        text: String,
        question_id: String,
        options: Vec<String>,
        progress: Progress,
        timestamp: DateTime<Utc>,
    },
    /// Final classification and therapy recommendations.
    AssessmentComplete {
        sender: String,
        dosha_results: Classification,
        panchakarma_recs: RecommendationSet,
        timestamp: DateTime<Utc>,
    },
}

const BOT: &str = "bot";

impl ServerMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Message {
            sender: BOT.to_string(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn typing() -> Self {
        Self::Typing {
            sender: BOT.to_string(),
        }
    }

    /// Build a question message. `number` is the 1-based question number.
    pub fn question(question: &QuestionDefinition, number: usize, total: usize) -> Self {
        Self::Question {
            sender: BOT.to_string(),
            text: question.prompt.clone(),
            question_id: question.id.clone(),
            options: question.options.clone(),
            progress: Progress {
                current: number,
                total,
            },
            timestamp: Utc::now(),
        }
    }

    /// Build a re-ask of the same question after an invalid selection.
    pub fn reask(question: &QuestionDefinition, number: usize, total: usize) -> Self {
        let mut msg = Self::question(question, number, total);
        if let Self::Question { text, .. } = &mut msg {
            *text = format!(
                "{} Please select one of the options below:",
                question.prompt
            );
        }
        msg
    }

    pub fn assessment_complete(outcome: &AssessmentOutcome) -> Self {
        Self::AssessmentComplete {
            sender: BOT.to_string(),
            dosha_results: outcome.dosha_results.clone(),
            panchakarma_recs: outcome.panchakarma_recs.clone(),
            timestamp: Utc::now(),
        }
    }
}
