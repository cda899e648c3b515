//! Pairwise interaction prompt and defensive verdict parsing.

use serde::Deserialize;

use crate::model::{Drug, RiskRating};

/// Parsed (or degraded) verdict content from a reasoning response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictPayload {
    pub summary: String,
    pub details: String,
    pub rating: RiskRating,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    details: String,
    #[serde(default)]
    rating: String,
}

/// Build the interaction-analysis prompt for a drug pair.
///
/// The payload carries both drugs' full descriptive attributes so the
/// verdict can account for indications, warnings, mechanism, dosage, and
/// contraindications rather than names alone.
pub fn pair_prompt(a: &Drug, b: &Drug) -> String {
    format!(
        r#"You are a highly knowledgeable pharmacology expert.
Analyze the following two drugs for potential interactions or cross-reactions:

Drug 1:
{}

Drug 2:
{}

Please respond in JSON format with the following fields:
{{
  "summary": "A short summary of the interaction",
  "rating": "One of: 'Safe', 'Warning', or 'Prohibited'",
  "details": "Additional explanation and usage considerations"
}}

Use the following guidelines to decide the 'rating':
- "Safe": The interaction poses minimal clinical risk.
  Any potential side effects are mild enough that most patients could tolerate them without significant medical intervention.
  Examples: Mild GI discomfort, slight headache, or minor fatigue that typically resolves without seeing a doctor.

- "Warning": The interaction is moderate and may cause notable symptoms or complications that could seriously affect quality of life if not addressed.
  Seeking medical advice is recommended, but this combination is not necessarily life-threatening if monitored properly.
  Examples: Moderate GI bleeding risk, potential for organ function compromise that requires medical follow-up, or severe allergic reaction (but manageable with timely intervention).

- "Prohibited": The interaction is severe or potentially life-threatening.
  Using these two drugs together could lead to hospitalization or result in permanent damage, significant disability, or even death.
  Examples: Drugs that cause fatal cardiac arrhythmias, major organ failure, or extremely high hemorrhage risk when combined.

Important:
- Return a valid JSON object with no additional text or code fencing.
- Do not wrap the JSON in triple backticks or any Markdown code block.
- Do not include any extra keys or text outside the JSON object.
- Keep your response concise and strictly follow the above format."#,
        a.description(),
        b.description(),
    )
}

/// Strip markdown code fencing from a model response.
fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a reasoning response into a verdict, degrading instead of failing.
///
/// Strict JSON parse first, retried after unwrapping markdown fences. If
/// the content still does not parse, the cleaned text becomes the summary
/// with `rating = Unknown`; a parse failure is never a hard error.
pub fn parse_verdict(raw: &str) -> VerdictPayload {
    let cleaned = strip_fences(raw);

    match serde_json::from_str::<RawVerdict>(&cleaned) {
        Ok(parsed) => VerdictPayload {
            summary: parsed.summary,
            details: parsed.details,
            rating: RiskRating::parse(&parsed.rating),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable verdict response, degrading to Unknown");
            VerdictPayload {
                summary: cleaned,
                details: String::new(),
                rating: RiskRating::Unknown,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResolutionSource;
    use chrono::Utc;

    fn drug(name: &str) -> Drug {
        Drug {
            id: format!("id-{name}"),
            name: name.to_string(),
            category: "NSAID".to_string(),
            indications: vec!["Pain".to_string()],
            warnings: vec!["Bleeding".to_string()],
            mechanism_of_action: "COX inhibition".to_string(),
            dosage: "325 mg".to_string(),
            contraindications: vec!["Ulcer".to_string()],
            source: ResolutionSource::Cached,
            last_resolved_at: Utc::now(),
        }
    }

    #[test]
    fn prompt_includes_both_descriptions_and_guidelines() {
        let prompt = pair_prompt(&drug("AspirinX"), &drug("WarfarinY"));
        assert!(prompt.contains("Name: AspirinX"));
        assert!(prompt.contains("Name: WarfarinY"));
        assert!(prompt.contains("Contraindications: Ulcer"));
        assert!(prompt.contains("\"Prohibited\""));
        assert!(prompt.contains("JSON"));
    }

    #[test]
    fn parses_clean_json() {
        let payload = parse_verdict(
            r#"{"summary": "Bleeding risk", "rating": "Warning", "details": "Monitor INR"}"#,
        );
        assert_eq!(payload.summary, "Bleeding risk");
        assert_eq!(payload.details, "Monitor INR");
        assert_eq!(payload.rating, RiskRating::Warning);
    }

    #[test]
    fn parses_fenced_json() {
        let payload = parse_verdict(
            "```json\n{\"summary\": \"Severe\", \"rating\": \"Prohibited\", \"details\": \"Avoid\"}\n```",
        );
        assert_eq!(payload.summary, "Severe");
        assert_eq!(payload.rating, RiskRating::Prohibited);
    }

    #[test]
    fn parses_bare_fenced_json() {
        let payload =
            parse_verdict("```\n{\"summary\": \"ok\", \"rating\": \"Safe\", \"details\": \"\"}\n```");
        assert_eq!(payload.rating, RiskRating::Safe);
    }

    #[test]
    fn missing_fields_default_to_empty_and_unknown() {
        let payload = parse_verdict(r#"{"summary": "partial"}"#);
        assert_eq!(payload.summary, "partial");
        assert_eq!(payload.details, "");
        assert_eq!(payload.rating, RiskRating::Unknown);
    }

    #[test]
    fn free_text_degrades_to_unknown_with_text_as_summary() {
        let payload = parse_verdict("These drugs are generally fine together.");
        assert_eq!(payload.rating, RiskRating::Unknown);
        assert_eq!(payload.summary, "These drugs are generally fine together.");
        assert_eq!(payload.details, "");
    }

    #[test]
    fn unrecognized_rating_degrades_to_unknown() {
        let payload =
            parse_verdict(r#"{"summary": "s", "rating": "Caution", "details": "d"}"#);
        assert_eq!(payload.rating, RiskRating::Unknown);
        assert_eq!(payload.summary, "s");
    }
}
