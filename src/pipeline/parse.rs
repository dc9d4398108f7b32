//! Result parsing: raw model text → [`Verdict`].
//!
//! Models are told to answer with bare JSON but regularly wrap it in
//! ` ```json ... ``` ` anyway. Every fence marker is removed, wherever it
//! appears, before strict JSON parsing. Anything that is not a JSON object
//! with the verdict fields is a failed attempt, never a partial result.
//!
//! ## Field mapping
//!
//! The two instruction styles name their fields differently. A private wire
//! struct accepts both spellings and converts into the single public shape:
//!
//! | Verdict field    | Accepted keys                      |
//! |------------------|------------------------------------|
//! | `score`          | `score`, `match_score`             |
//! | `summary`        | `summary`, `reason`                |
//! | `missing_skills` | `missing_skills`, `skills_missing` |

use crate::error::ParseError;
use crate::output::{SourceRef, Verdict};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static RE_FENCE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

/// Wire shape of a verdict as the model writes it.
#[derive(Debug, Deserialize)]
struct WireVerdict {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "match_score")]
    score: Option<i64>,
    #[serde(default, alias = "reason")]
    summary: Option<String>,
    #[serde(default, alias = "skills_missing")]
    missing_skills: Vec<String>,
    #[serde(default)]
    experience_years: Option<i64>,
}

impl WireVerdict {
    fn into_verdict(self, source: SourceRef) -> Verdict {
        Verdict {
            name: self.name,
            score: self.score,
            summary: self.summary,
            missing_skills: self.missing_skills,
            experience_years: self.experience_years,
            source,
        }
    }
}

/// Remove every ` ```json ` and ` ``` ` marker and trim the result.
pub fn strip_code_fences(raw: &str) -> String {
    RE_FENCE_MARKER.replace_all(raw, "").trim().to_string()
}

/// Parse a model response into a verdict for `source`.
pub fn parse_verdict(raw: &str, source: SourceRef) -> Result<Verdict, ParseError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(ParseError::Empty);
    }

    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| ParseError::Json(e.to_string()))?;

    if !value.is_object() {
        return Err(ParseError::NotAnObject {
            found: json_kind(&value),
        });
    }

    let wire: WireVerdict =
        serde_json::from_value(value).map_err(|e| ParseError::Schema(e.to_string()))?;

    Ok(wire.into_verdict(source))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src() -> SourceRef {
        SourceRef {
            index: 0,
            name: "jane.pdf".into(),
            mime: "application/pdf".into(),
        }
    }

    const DETAILED: &str = r#"{
        "name": "Jane Doe",
        "match_score": 85,
        "summary": "Strong Go background.",
        "missing_skills": ["Kubernetes"],
        "experience_years": 6
    }"#;

    #[test]
    fn parses_detailed_shape() {
        let v = parse_verdict(DETAILED, src()).unwrap();
        assert_eq!(v.name.as_deref(), Some("Jane Doe"));
        assert_eq!(v.score, Some(85));
        assert_eq!(v.summary.as_deref(), Some("Strong Go background."));
        assert_eq!(v.missing_skills, vec!["Kubernetes"]);
        assert_eq!(v.experience_years, Some(6));
        assert_eq!(v.source, src());
    }

    #[test]
    fn fenced_equals_unfenced() {
        let fenced = format!("```json\n{DETAILED}\n```");
        assert_eq!(
            parse_verdict(&fenced, src()).unwrap(),
            parse_verdict(DETAILED, src()).unwrap()
        );

        let bare_fence = format!("Here you go:\n```\n{DETAILED}\n```\n");
        assert!(parse_verdict(&bare_fence, src()).is_err(), "prose outside fences is not JSON");

        let plain_fence = format!("  ```\n{DETAILED}\n```  ");
        assert_eq!(
            parse_verdict(&plain_fence, src()).unwrap(),
            parse_verdict(DETAILED, src()).unwrap()
        );
    }

    #[test]
    fn compact_shape_maps_to_same_fields() {
        let raw = r#"{"name":"Jane Doe","score":85,"reason":"Strong Go background.","skills_missing":["Kubernetes"]}"#;
        let v = parse_verdict(raw, src()).unwrap();
        assert_eq!(v.score, Some(85));
        assert_eq!(v.summary.as_deref(), Some("Strong Go background."));
        assert_eq!(v.missing_skills, vec!["Kubernetes"]);
        assert_eq!(v.experience_years, None);
    }

    #[test]
    fn missing_fields_default() {
        let v = parse_verdict("{}", src()).unwrap();
        assert_eq!(v.name, None);
        assert_eq!(v.score, None);
        assert!(v.missing_skills.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let v = parse_verdict(r#"{"score": 40, "confidence": "high"}"#, src()).unwrap();
        assert_eq!(v.score, Some(40));
    }

    #[test]
    fn malformed_json_fails() {
        let err = parse_verdict(r#"{"name": "Jane", "match_score": 8"#, src()).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)), "{err:?}");

        let err = parse_verdict("Error: quota exceeded", src()).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)), "{err:?}");
    }

    #[test]
    fn non_object_top_level_fails() {
        let err = parse_verdict(r#"["Jane", 85]"#, src()).unwrap_err();
        assert_eq!(err, ParseError::NotAnObject { found: "array" });

        let err = parse_verdict("85", src()).unwrap_err();
        assert_eq!(err, ParseError::NotAnObject { found: "number" });
    }

    #[test]
    fn wrong_field_types_fail() {
        let err = parse_verdict(r#"{"match_score": "eighty"}"#, src()).unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)), "{err:?}");
    }

    #[test]
    fn empty_after_stripping_fails() {
        assert_eq!(parse_verdict("```json\n```", src()), Err(ParseError::Empty));
        assert_eq!(parse_verdict("   ", src()), Err(ParseError::Empty));
    }

    #[test]
    fn out_of_range_score_is_kept() {
        let v = parse_verdict(r#"{"score": 250}"#, src()).unwrap();
        assert_eq!(v.score, Some(250));
    }
}
