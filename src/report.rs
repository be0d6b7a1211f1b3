//! Markdown assessment report — a pure function of the engine output.

use chrono::{DateTime, Utc};

use crate::assessment::{AssessmentOutcome, Dosha, TherapyTier};

/// Render an assessment report as Markdown.
///
/// Takes the timestamp as a parameter so identical input always renders
/// an identical report.
pub fn render_report(outcome: &AssessmentOutcome, generated_at: DateTime<Utc>) -> String {
    let results = &outcome.dosha_results;
    let mut out = String::new();

    out.push_str("# AyurSutra Assessment Report\n\n");
    out.push_str("Ayurvedic Wellness Analysis\n\n");

    out.push_str("## Your Dosha Results\n\n");
    out.push_str("| Dosha | Percentage |\n");
    out.push_str("| --- | --- |\n");
    for dosha in Dosha::ALL {
        out.push_str(&format!(
            "| {} | {}% |\n",
            dosha.display_name(),
            results.percentages.get(dosha)
        ));
    }
    out.push_str(&format!(
        "\n**Dominant Dosha:** {}\n",
        results.dominant_dosha.display_name()
    ));
    if let Some(secondary) = results.secondary_dosha {
        out.push_str(&format!(
            "**Secondary Dosha:** {}\n",
            secondary.display_name()
        ));
    }

    out.push_str("\n## Recommended Therapies\n\n");
    for therapy in &outcome.panchakarma_recs.therapy_details {
        let tier = match therapy.tier {
            TherapyTier::Primary => "Primary",
            TherapyTier::Secondary => "Secondary",
        };
        out.push_str(&format!(
            "- **{}** ({}, balances {}): {}\n",
            therapy.name,
            tier,
            therapy.dosha.display_name(),
            therapy.description
        ));
        out.push_str(&format!("  - Duration: {}\n", therapy.duration));
        out.push_str(&format!("  - Benefits: {}\n", therapy.benefits));
        if let Some(precautions) = &therapy.precautions {
            out.push_str(&format!("  - Precautions: {}\n", precautions));
        }
    }

    out.push_str(&format!(
        "\n_Generated on: {}_\n",
        generated_at.format("%Y-%m-%d")
    ));
    out
}
