//! Optional intent classifier — small-talk replies outside the questionnaire.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use regex::Regex;
use tracing::debug;

/// Result of attempting to classify a free-text message.
///
/// `NotClassified` is an explicit outcome, never a swallowed failure: the
/// dispatcher falls back to its fixed default response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyOutcome {
    Reply(String),
    NotClassified,
}

/// A collaborator that may answer free-text messages.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn try_classify(&self, text: &str) -> ClassifyOutcome;
}

struct Intent {
    tag: &'static str,
    keywords: &'static [&'static str],
    responses: &'static [&'static str],
}

const INTENTS: &[Intent] = &[
    Intent {
        tag: "greeting",
        keywords: &["hello", "hi", "hey", "namaste"],
        responses: &[
            "Namaste! How can I help you on your wellness journey today?",
            "Namaste! I'm here whenever you're ready.",
        ],
    },
    Intent {
        tag: "thanks",
        keywords: &["thanks", "thank", "appreciated"],
        responses: &[
            "You're most welcome!",
            "Happy to help — be well!",
        ],
    },
    Intent {
        tag: "farewell",
        keywords: &["bye", "goodbye", "farewell"],
        responses: &[
            "Goodbye! Take care of your balance.",
            "Namaste, until next time!",
        ],
    },
    Intent {
        tag: "dosha_info",
        keywords: &["dosha", "doshas", "prakriti", "vata", "pitta", "kapha"],
        responses: &[
            "Doshas are the three energies of Ayurveda — Vata, Pitta, and Kapha. Your \
             dominant dosha shapes your constitution, or Prakriti.",
        ],
    },
    Intent {
        tag: "panchakarma_info",
        keywords: &["panchakarma", "therapy", "therapies", "treatment"],
        responses: &[
            "Panchakarma is a set of cleansing therapies chosen to balance your dominant \
             dosha. Complete the assessment and I'll recommend some for you.",
        ],
    },
];

/// Keyword-based classifier over a small static intent table.
pub struct KeywordClassifier {
    cleaner: Regex,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            // Anything that is not a letter or digit splits tokens.
            cleaner: Regex::new(r"[^a-z0-9]+").expect("static regex"),
        }
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        self.cleaner
            .split(&text.to_lowercase())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn try_classify(&self, text: &str) -> ClassifyOutcome {
        let tokens = self.tokens(text);
        for intent in INTENTS {
            if tokens.iter().any(|t| intent.keywords.contains(&t.as_str())) {
                debug!(intent = intent.tag, "Matched free-text intent");
                let reply = intent
                    .responses
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(intent.responses[0]);
                return ClassifyOutcome::Reply(reply.to_string());
            }
        }
        ClassifyOutcome::NotClassified
    }
}
