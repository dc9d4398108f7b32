//! Instruction templates and request section headers.
//!
//! Callers can override the instruction via
//! [`crate::config::RankingConfig::instruction`]; the constants here are used
//! only when no override is provided.

use crate::config::InstructionStyle;

/// Instruction asking for the detailed verdict shape
/// (`match_score`, `summary`, `missing_skills`, `experience_years`).
pub const DETAILED_INSTRUCTION: &str = r#"You are a high-precision ATS. Analyze the resume against the JD.
Output ONLY raw JSON. No Markdown. No ```json.
Structure:
{
    "name": "Candidate Name",
    "match_score": 85,
    "summary": "Direct, brutal assessment of fit.",
    "missing_skills": ["skill1", "skill2"],
    "experience_years": 5
}"#;

/// Instruction asking for the compact verdict shape
/// (`score`, `reason`, `skills_missing`).
pub const COMPACT_INSTRUCTION: &str = r#"You are an experienced technical recruiter acting as an ATS.
Evaluate how well the resume matches the job description.
Output ONLY raw JSON. No Markdown. No ```json.
Structure:
{
    "name": "Candidate Name",
    "score": 85,
    "reason": "One or two sentences on the fit.",
    "skills_missing": ["skill1", "skill2"]
}"#;

/// Header placed before the job description.
pub const JOB_DESCRIPTION_HEADER: &str = "\n\n### JOB DESCRIPTION:\n";

/// Header placed before extracted resume text.
pub const RESUME_TEXT_HEADER: &str = "\n\n### RESUME TEXT:\n";

/// Header placed before an attached resume image.
pub const RESUME_IMAGE_HEADER: &str = "\n\n### RESUME IMAGE:\n";

/// Built-in instruction for a style.
pub fn instruction_for(style: InstructionStyle) -> &'static str {
    match style {
        InstructionStyle::Detailed => DETAILED_INSTRUCTION,
        InstructionStyle::Compact => COMPACT_INSTRUCTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_name_their_score_field() {
        assert!(instruction_for(InstructionStyle::Detailed).contains("\"match_score\""));
        assert!(instruction_for(InstructionStyle::Compact).contains("\"score\""));
        assert!(instruction_for(InstructionStyle::Compact).contains("\"skills_missing\""));
    }
}
