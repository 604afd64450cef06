//! Validated decoding of structured model output.
//!
//! The model is asked for JSON objects; anything that is not a JSON object
//! with the required fields of the required types is a
//! [`LearnError::MalformedResponse`].

use crate::error::{LearnError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A quiz question paired with the answer it was generated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,
    pub correct_answer: String,
}

/// The model's judgement of a learner's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerVerdict {
    pub is_correct: bool,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hint: Option<String>,
}

impl GeneratedQuestion {
    pub fn decode(content: &str) -> Result<Self> {
        const EXPECTED: &str = "question";
        let object = parse_object(content, EXPECTED)?;

        let question = required_text(&object, "question", EXPECTED)?;
        if question.trim().is_empty() {
            return Err(LearnError::malformed(EXPECTED, "field 'question' is blank"));
        }
        let correct_answer = required_answer(&object, "correctAnswer", EXPECTED)?;

        Ok(Self {
            question,
            correct_answer,
        })
    }
}

impl AnswerVerdict {
    pub fn decode(content: &str) -> Result<Self> {
        const EXPECTED: &str = "verdict";
        let object = parse_object(content, EXPECTED)?;

        let is_correct = match object.get("isCorrect") {
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(LearnError::malformed(
                    EXPECTED,
                    format!("field 'isCorrect' should be a boolean, got {}", type_name(other)),
                ))
            }
            None => return Err(missing(EXPECTED, "isCorrect")),
        };
        let explanation = required_text(&object, "explanation", EXPECTED)?;
        let next_hint = match object.get("nextHint") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(LearnError::malformed(
                    EXPECTED,
                    format!("field 'nextHint' should be a string, got {}", type_name(other)),
                ))
            }
        };

        Ok(Self {
            is_correct,
            explanation,
            next_hint,
        })
    }
}

type Object = serde_json::Map<String, Value>;

fn parse_object(content: &str, expected: &'static str) -> Result<Object> {
    match serde_json::from_str::<Value>(content.trim()) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(LearnError::malformed(
            expected,
            format!("expected a JSON object, got {}", type_name(&other)),
        )),
        Err(e) => Err(LearnError::malformed(expected, format!("invalid JSON: {}", e))),
    }
}

fn required_text(object: &Object, field: &str, expected: &'static str) -> Result<String> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(LearnError::malformed(
            expected,
            format!("field '{}' should be a string, got {}", field, type_name(other)),
        )),
        None => Err(missing(expected, field)),
    }
}

/// Like `required_text`, but numeric answers are taken as their text form.
fn required_answer(object: &Object, field: &str, expected: &'static str) -> Result<String> {
    match object.get(field) {
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => required_text(object, field, expected),
    }
}

fn missing(expected: &'static str, field: &str) -> LearnError {
    LearnError::malformed(expected, format!("missing field '{}'", field))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
