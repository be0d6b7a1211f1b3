//! Deterministic scoring engine — canonical tokens to dosha percentages.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::{Catalog, Dosha};
use crate::error::AssessmentError;

/// One normalized answer: a question id and its canonical token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub token: String,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            token: token.into(),
        }
    }
}

/// Per-dosha values, serialized under lowercase dosha keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoshaBreakdown<T> {
    pub vata: T,
    pub pitta: T,
    pub kapha: T,
}

impl<T: Copy> DoshaBreakdown<T> {
    pub fn get(&self, dosha: Dosha) -> T {
        match dosha {
            Dosha::Vata => self.vata,
            Dosha::Pitta => self.pitta,
            Dosha::Kapha => self.kapha,
        }
    }

    pub fn get_mut(&mut self, dosha: Dosha) -> &mut T {
        match dosha {
            Dosha::Vata => &mut self.vata,
            Dosha::Pitta => &mut self.pitta,
            Dosha::Kapha => &mut self.kapha,
        }
    }
}

/// The classification computed from a completed answer set.
///
/// Percentages are integers that sum to exactly 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub scores: DoshaBreakdown<u32>,
    pub percentages: DoshaBreakdown<u32>,
    pub dominant_dosha: Dosha,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_dosha: Option<Dosha>,
}

/// The static vote table: each canonical token votes for one dosha.
fn token_vote(token: &str) -> Option<Dosha> {
    use Dosha::*;
    let dosha = match token {
        "thin" | "dry" | "irregular" | "variable" | "light" | "anxious" | "worried"
        | "warm" => Vata,
        "medium" | "oily" | "fine" | "strong" | "high" | "moderate" | "intense"
        | "irritable" | "cool" => Pitta,
        "heavy" | "normal" | "thick" | "regular" | "slow" | "low" | "deep" | "calm" => Kapha,
        _ => return None,
    };
    Some(dosha)
}

/// Rank the doshas by raw score descending, enumeration order among ties.
fn ranked(scores: &DoshaBreakdown<u32>) -> [Dosha; 3] {
    let mut order = Dosha::ALL;
    order.sort_by_key(|d| (std::cmp::Reverse(scores.get(*d)), d.index()));
    order
}

/// Score a complete answer set into a [`Classification`].
///
/// `answers` must contain exactly one entry per catalog question; the
/// state machine only calls this at completion, so a size mismatch is a
/// contract failure, never a partial result.
pub fn score(
    catalog: &Catalog,
    answers: &[Answer],
) -> std::result::Result<Classification, AssessmentError> {
    if answers.len() != catalog.len() {
        return Err(AssessmentError::IncompleteAnswerSet {
            expected: catalog.len(),
            actual: answers.len(),
        });
    }

    let mut scores = DoshaBreakdown {
        vata: 0u32,
        pitta: 0,
        kapha: 0,
    };
    for answer in answers {
        match token_vote(&answer.token) {
            Some(dosha) => *scores.get_mut(dosha) += 1,
            None => warn!(
                question_id = %answer.question_id,
                token = %answer.token,
                "Token has no vote table entry, skipping"
            ),
        }
    }

    let total = scores.vata + scores.pitta + scores.kapha;
    if total == 0 {
        warn!("No answer produced a vote, classification degenerates to the tie-break dosha");
    }

    // Independent rounding will not sum to 100 in general; the drift is
    // reconciled onto the dosha with the highest raw score (lowest
    // enumeration index among ties).
    let mut percentages = DoshaBreakdown {
        vata: 0i64,
        pitta: 0,
        kapha: 0,
    };
    for dosha in Dosha::ALL {
        if total > 0 {
            let pct = (f64::from(scores.get(dosha)) / f64::from(total) * 100.0).round();
            *percentages.get_mut(dosha) = pct as i64;
        }
    }
    let drift = 100 - (percentages.vata + percentages.pitta + percentages.kapha);
    let order = ranked(&scores);
    *percentages.get_mut(order[0]) += drift;

    let dominant_dosha = order[0];
    let secondary_dosha = (scores.get(order[1]) > 0).then_some(order[1]);

    Ok(Classification {
        scores,
        percentages: DoshaBreakdown {
            vata: percentages.vata as u32,
            pitta: percentages.pitta as u32,
            kapha: percentages.kapha as u32,
        },
        dominant_dosha,
        secondary_dosha,
    })
}
