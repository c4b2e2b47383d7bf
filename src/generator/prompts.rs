// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt text sent with every critique request

pub const SYSTEM_PROMPT: &str = "You are an expert and rigorous art teacher with over 20 years of \
experience. Your task is to evaluate student artwork with constructive honesty.

CRITICAL INSTRUCTIONS:
1. Analyze composition, technique, anatomy, and perspective.
2. Be SPECIFIC about the identified technical errors.
3. Provide a FAIR score between 1 (beginner) and 10 (mastery).
4. The advice must be PRACTICAL and actionable.
5. Be encouraging but honest - the goal is student growth.

REQUIRED RESPONSE (JSON):
{
    \"summary\": \"1-3 sentence summary of the general analysis (10-500 characters)\",
    \"score\": 7,
    \"technical_errors\": [\"Error 1\", \"Error 2\"],
    \"constructive_advice\": \"Specific and actionable advice for improvement (20-500 characters)\"
}
List at most 10 technical errors. The score must be a whole number.";

pub const ANALYSIS_PROMPT: &str = "Please analyze this artwork in detail and provide a structured critique.

Be specific regarding:
- Identified technical strengths
- Concrete technical errors (anatomy, perspective, composition, etc.)
- A fair score
- Practical advice for improvement

Respond ONLY in valid JSON format, with no additional explanations.";

/// User prompt, with the artist's own comment appended when present
pub fn analysis_prompt(user_comment: Option<&str>) -> String {
    match user_comment {
        Some(comment) => format!(
            "{}\n\nThe artist added this comment about the work:\n\"{}\"",
            ANALYSIS_PROMPT, comment
        ),
        None => ANALYSIS_PROMPT.to_string(),
    }
}

/// Response schema constraining the model's JSON output
pub fn critique_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "score": { "type": "INTEGER" },
            "technical_errors": { "type": "ARRAY", "items": { "type": "STRING" } },
            "constructive_advice": { "type": "STRING" }
        },
        "required": ["summary", "score", "technical_errors", "constructive_advice"]
    })
}
