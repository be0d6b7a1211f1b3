//! Recommendation engine — maps a classification to Panchakarma therapies.

use serde::{Deserialize, Serialize};

use super::catalog::Dosha;
use super::scoring::Classification;

/// Whether a therapy targets the dominant dosha or a secondary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TherapyTier {
    Primary,
    Secondary,
}

/// A recommended Panchakarma therapy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Therapy {
    pub name: String,
    pub description: String,
    pub duration: String,
    pub benefits: String,
    /// The dosha this therapy balances.
    pub dosha: Dosha,
    /// Serialized as `category` — the key the report and clients consume.
    #[serde(rename = "category")]
    pub tier: TherapyTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precautions: Option<String>,
}

/// The ranked therapy recommendations for a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub primary_dosha: Dosha,
    pub therapy_details: Vec<Therapy>,
}

struct TherapyDef {
    name: &'static str,
    description: &'static str,
    duration: &'static str,
    benefits: &'static str,
    precautions: Option<&'static str>,
}

/// Fixed per-dosha candidate therapies, in presentation order.
fn therapies_for(dosha: Dosha) -> &'static [TherapyDef] {
    match dosha {
        Dosha::Vata => &[
            TherapyDef {
                name: "Basti",
                description:
                    "Medicated enema therapy that cleanses the colon and pacifies aggravated Vata.",
                duration: "8-30 days",
                benefits:
                    "Relieves constipation, calms the nervous system, restores Vata balance",
                precautions: Some("Avoid during acute fever or digestive upset"),
            },
            TherapyDef {
                name: "Abhyanga",
                description:
                    "Full-body warm oil massage that grounds Vata and nourishes dry tissue.",
                duration: "45-60 minutes per session",
                benefits: "Improves circulation, eases joint stiffness, promotes deep sleep",
                precautions: None,
            },
        ],
        Dosha::Pitta => &[
            TherapyDef {
                name: "Virechana",
                description:
                    "Therapeutic purgation that clears excess heat and bile from the body.",
                duration: "3-7 days",
                benefits: "Cools Pitta, clears skin inflammation, improves digestion",
                precautions: Some("Requires supervised dietary preparation"),
            },
            TherapyDef {
                name: "Raktamokshana",
                description:
                    "Controlled blood-letting therapy for Pitta disorders of the blood.",
                duration: "1-2 sessions",
                benefits: "Relieves chronic skin conditions, reduces localized inflammation",
                precautions: Some("Performed only by trained practitioners"),
            },
        ],
        Dosha::Kapha => &[
            TherapyDef {
                name: "Vamana",
                description:
                    "Therapeutic emesis that expels accumulated Kapha from the chest and stomach.",
                duration: "1-3 days",
                benefits: "Clears congestion, lightens the body, sharpens digestion",
                precautions: Some("Contraindicated for children and the elderly"),
            },
            TherapyDef {
                name: "Nasya",
                description:
                    "Nasal administration of medicated oils to clear Kapha from the head.",
                duration: "7-14 days",
                benefits: "Relieves sinus congestion, clears the mind, improves breathing",
                precautions: None,
            },
        ],
    }
}

/// Select therapies for the top-N doshas by percentage.
///
/// Doshas are ranked by percentage descending with enumeration order
/// breaking ties; doshas at zero percent never contribute. The dominant
/// dosha's therapies are `Primary`, the rest `Secondary`. Output is
/// stable for identical input.
pub fn recommend(result: &Classification, top_n: usize) -> RecommendationSet {
    let mut order = Dosha::ALL;
    order.sort_by_key(|d| (std::cmp::Reverse(result.percentages.get(*d)), d.index()));

    let mut therapy_details = Vec::new();
    for (rank, dosha) in order.iter().take(top_n).enumerate() {
        if result.percentages.get(*dosha) == 0 {
            continue;
        }
        let tier = if rank == 0 {
            TherapyTier::Primary
        } else {
            TherapyTier::Secondary
        };
        for def in therapies_for(*dosha) {
            therapy_details.push(Therapy {
                name: def.name.to_string(),
                description: def.description.to_string(),
                duration: def.duration.to_string(),
                benefits: def.benefits.to_string(),
                dosha: *dosha,
                tier,
                precautions: def.precautions.map(str::to_string),
            });
        }
    }

    RecommendationSet {
        primary_dosha: order[0],
        therapy_details,
    }
}
