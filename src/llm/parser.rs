//! Structured replies from the reasoning service
//!
//! Replies are free text that should contain one JSON object. We locate the
//! outermost braces, decode into a typed shape, and report anything else as
//! `ReasoningError::Malformed`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::llm::reasoner::ReasoningError;

/// Importance rating for a new memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceReply {
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedActivity {
    pub description: String,
    pub location: String,
    pub duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReply {
    pub actions: Vec<PlannedActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionReply {
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientReply {
    pub npc1_line: String,
    pub npc2_line: String,
}

/// Post-conversation relationship analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAnalysis {
    pub trust_change: f64,
    pub respect_change: f64,
    pub summary: String,
}

/// Slice from the first `{` to the last `}`
pub fn extract_json(response: &str) -> Result<&str, ReasoningError> {
    let start = response
        .find('{')
        .ok_or_else(|| ReasoningError::Malformed("No JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| ReasoningError::Malformed("No closing brace found in response".into()))?;
    if end < start {
        return Err(ReasoningError::Malformed("Braces out of order".into()));
    }
    Ok(&response[start..=end])
}

/// Decode the JSON object embedded in `response`
pub fn parse_reply<T: DeserializeOwned>(response: &str) -> Result<T, ReasoningError> {
    let json = extract_json(response)?;
    serde_json::from_str(json).map_err(|e| ReasoningError::Malformed(e.to_string()))
}

pub fn importance_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": { "score": { "type": "integer" } },
        "required": ["score"]
    })
}

pub fn plan_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "actions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "description": { "type": "string" },
                        "location": { "type": "string" },
                        "duration": { "type": "number" }
                    },
                    "required": ["description", "location", "duration"]
                }
            }
        },
        "required": ["actions"]
    })
}

pub fn reflection_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "insights": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["insights"]
    })
}

pub fn ambient_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "npc1_line": { "type": "string" },
            "npc2_line": { "type": "string" }
        },
        "required": ["npc1_line", "npc2_line"]
    })
}

pub fn social_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "trustChange": { "type": "number" },
            "respectChange": { "type": "number" },
            "summary": { "type": "string" }
        },
        "required": ["trustChange", "respectChange", "summary"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_simple() {
        let response = r#"{"score": 4}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here you go:\n```json\n{\"score\": 4}\n```\nHope that helps!";
        assert_eq!(extract_json(response).unwrap(), "{\"score\": 4}");
    }

    #[test]
    fn test_extract_json_no_json() {
        assert!(matches!(
            extract_json("just words"),
            Err(ReasoningError::Malformed(_))
        ));
        assert!(matches!(extract_json("} backwards {"), Err(ReasoningError::Malformed(_))));
    }

    #[test]
    fn test_parse_plan_reply() {
        let reply: PlanReply = parse_reply(
            r#"{"actions": [{"description": "Buy bread", "location": "Bakery", "duration": 15}]}"#,
        )
        .unwrap();
        assert_eq!(reply.actions.len(), 1);
        assert_eq!(reply.actions[0].location, "Bakery");
        assert_eq!(reply.actions[0].duration, 15.0);
    }

    #[test]
    fn test_parse_social_analysis_camel_case() {
        let reply: SocialAnalysis =
            parse_reply(r#"{"trustChange": 3, "respectChange": -2, "summary": "Argued about taxes"}"#)
                .unwrap();
        assert_eq!(reply.trust_change, 3.0);
        assert_eq!(reply.respect_change, -2.0);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let result: Result<ImportanceReply, _> = parse_reply(r#"{"rating": 3}"#);
        assert!(matches!(result, Err(ReasoningError::Malformed(_))));
    }
}
