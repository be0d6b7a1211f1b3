//! Question catalog and answer normalizer.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AssessmentError;

/// The three doshas — the classification buckets every answer votes into.
///
/// Enumeration order (Vata, Pitta, Kapha) is the deterministic tie-break
/// order used by the scoring and recommendation engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dosha {
    Vata,
    Pitta,
    Kapha,
}

impl Dosha {
    /// All doshas in enumeration (tie-break) order.
    pub const ALL: [Dosha; 3] = [Dosha::Vata, Dosha::Pitta, Dosha::Kapha];

    /// Position in the enumeration order.
    pub fn index(&self) -> usize {
        match self {
            Self::Vata => 0,
            Self::Pitta => 1,
            Self::Kapha => 2,
        }
    }

    /// Capitalized name for human-facing text.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Vata => "Vata",
            Self::Pitta => "Pitta",
            Self::Kapha => "Kapha",
        }
    }
}

impl std::fmt::Display for Dosha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Vata => "vata",
            Self::Pitta => "pitta",
            Self::Kapha => "kapha",
        };
        write!(f, "{s}")
    }
}

/// Which aspect of the constitution a question probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Physical,
    Digestive,
    Lifestyle,
    Mental,
}

/// An immutable question definition: prompt, ordered options, and the
/// per-option canonical-token mapping used by the scoring vote table.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDefinition {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub category: QuestionCategory,
    /// Display option → canonical token. Internal to normalization.
    #[serde(skip)]
    mappings: Vec<(String, String)>,
}

impl QuestionDefinition {
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        category: QuestionCategory,
        options: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            category,
            mappings: Vec::new(),
        }
    }

    /// Map a display option to its canonical token.
    pub fn with_mapping(mut self, option: &str, token: &str) -> Self {
        self.mappings.push((option.to_string(), token.to_string()));
        self
    }

    /// Whether `selected` exactly matches one of this question's options.
    pub fn has_option(&self, selected: &str) -> bool {
        self.options.iter().any(|o| o == selected)
    }

    fn token_for(&self, option: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|(o, _)| o == option)
            .map(|(_, t)| t.as_str())
    }
}

/// The ordered question catalog. Built once at process start; never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    questions: Vec<QuestionDefinition>,
}

impl Catalog {
    pub fn new(questions: Vec<QuestionDefinition>) -> Self {
        Self { questions }
    }

    /// The standard ten-question constitution assessment.
    pub fn standard() -> Self {
        use QuestionCategory::*;

        Self::new(vec![
            QuestionDefinition::new(
                "body_frame",
                "What best describes your body frame?",
                Physical,
                &["Thin and light", "Medium build", "Heavy and large"],
            )
            .with_mapping("Thin and light", "thin")
            .with_mapping("Medium build", "medium")
            .with_mapping("Heavy and large", "heavy"),
            QuestionDefinition::new(
                "skin_type",
                "How would you describe your skin?",
                Physical,
                &["Dry and rough", "Oily and sensitive", "Smooth and oily", "Normal"],
            )
            .with_mapping("Dry and rough", "dry")
            .with_mapping("Oily and sensitive", "oily")
            .with_mapping("Smooth and oily", "oily")
            .with_mapping("Normal", "normal"),
            QuestionDefinition::new(
                "hair_texture",
                "What is your hair texture like?",
                Physical,
                &["Thin and dry", "Fine and oily", "Thick and oily", "Normal"],
            )
            .with_mapping("Thin and dry", "thin")
            .with_mapping("Fine and oily", "fine")
            .with_mapping("Thick and oily", "thick")
            .with_mapping("Normal", "normal"),
            QuestionDefinition::new(
                "appetite",
                "How would you describe your appetite?",
                Digestive,
                &["Irregular and variable", "Strong and regular", "Moderate and steady"],
            )
            .with_mapping("Irregular and variable", "irregular")
            .with_mapping("Strong and regular", "strong")
            .with_mapping("Moderate and steady", "regular"),
            QuestionDefinition::new(
                "digestion",
                "How is your digestion?",
                Digestive,
                &["Irregular", "Strong and fast", "Slow"],
            )
            .with_mapping("Irregular", "irregular")
            .with_mapping("Strong and fast", "strong")
            .with_mapping("Slow", "slow"),
            QuestionDefinition::new(
                "energy_level",
                "What are your energy levels like?",
                Lifestyle,
                &["Variable and irregular", "High and consistent", "Low and steady"],
            )
            .with_mapping("Variable and irregular", "variable")
            .with_mapping("High and consistent", "high")
            .with_mapping("Low and steady", "low"),
            QuestionDefinition::new(
                "sleep",
                "How would you describe your sleep?",
                Lifestyle,
                &["Light and interrupted", "Moderate", "Deep and sound"],
            )
            .with_mapping("Light and interrupted", "light")
            .with_mapping("Moderate", "moderate")
            .with_mapping("Deep and sound", "deep"),
            QuestionDefinition::new(
                "temperament",
                "Which best describes your temperament?",
                Mental,
                &["Anxious and creative", "Intense and ambitious", "Calm and stable"],
            )
            .with_mapping("Anxious and creative", "anxious")
            .with_mapping("Intense and ambitious", "intense")
            .with_mapping("Calm and stable", "calm"),
            QuestionDefinition::new(
                "stress_response",
                "How do you typically respond to stress?",
                Mental,
                &["Worried and anxious", "Irritable and angry", "Calm and peaceful"],
            )
            .with_mapping("Worried and anxious", "worried")
            .with_mapping("Irritable and angry", "irritable")
            .with_mapping("Calm and peaceful", "calm"),
            QuestionDefinition::new(
                "weather_preference",
                "What weather do you prefer?",
                Lifestyle,
                &["Warm and sunny", "Cool and moderate", "Warm and humid"],
            )
            .with_mapping("Warm and sunny", "warm")
            .with_mapping("Cool and moderate", "cool")
            .with_mapping("Warm and humid", "warm"),
        ])
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question at a 0-based position, if in range.
    pub fn question_at(&self, index: usize) -> Option<&QuestionDefinition> {
        self.questions.get(index)
    }

    pub fn find(&self, question_id: &str) -> Option<&QuestionDefinition> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn questions(&self) -> &[QuestionDefinition] {
        &self.questions
    }

    /// Normalize a selected option to its canonical token.
    ///
    /// The option must byte-for-byte match one of the question's options
    /// (no fuzzy matching). A missing mapping falls back to the lower-cased
    /// raw option so a catalog extension cannot crash live sessions.
    pub fn normalize(
        &self,
        question_id: &str,
        selected_option: &str,
    ) -> std::result::Result<String, AssessmentError> {
        let question = self
            .find(question_id)
            .ok_or_else(|| AssessmentError::UnknownQuestion {
                id: question_id.to_string(),
            })?;

        if !question.has_option(selected_option) {
            return Err(AssessmentError::InvalidOption {
                question_id: question_id.to_string(),
                selected: selected_option.to_string(),
            });
        }

        match question.token_for(selected_option) {
            Some(token) => Ok(token.to_string()),
            None => {
                warn!(
                    question_id = %question_id,
                    option = %selected_option,
                    "No canonical token mapped for option, falling back to lower-cased text"
                );
                Ok(selected_option.to_lowercase())
            }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
