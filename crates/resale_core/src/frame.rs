use engine_logging::engine_debug;
use serde::Deserialize;
use serde_json::Value;

use crate::payload::SearchPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepSignal {
    Start,
    Done,
}

/// One decoded line of the comparison stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    Step {
        step_id: String,
        status: StepSignal,
        pct: Option<f64>,
        label: Option<String>,
        detail: Option<String>,
    },
    Result(Box<SearchPayload>),
    Error(String),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireFrame {
    Step {
        step_id: String,
        status: StepSignal,
        #[serde(default)]
        pct: Option<Value>,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        detail: Option<String>,
    },
    Result {
        #[serde(default)]
        data: Option<SearchPayload>,
    },
    Error {
        #[serde(default)]
        error: Option<Value>,
    },
}

/// Parses one stream line. Blank, malformed or unrecognised lines yield `None`.
pub fn parse_frame(line: &str) -> Option<StreamFrame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let wire: WireFrame = match serde_json::from_str(line) {
        Ok(frame) => frame,
        Err(err) => {
            engine_debug!("Dropping unparseable frame ({} bytes): {}", line.len(), err);
            return None;
        }
    };

    Some(match wire {
        WireFrame::Step {
            step_id,
            status,
            pct,
            label,
            detail,
        } => StreamFrame::Step {
            step_id,
            status,
            pct: pct
                .and_then(|v| v.as_f64())
                .filter(|p| p.is_finite())
                .map(|p| p.clamp(0.0, 1.0)),
            label,
            detail,
        },
        WireFrame::Result { data } => StreamFrame::Result(Box::new(data.unwrap_or_default())),
        WireFrame::Error { error } => StreamFrame::Error(error_message(error.as_ref())),
    })
}

/// Extracts a readable message: string, `error`, `detail`, JSON text, then "Unknown error".
pub fn error_message(error: Option<&Value>) -> String {
    match error {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::Object(map)) => ["error", "detail"]
            .iter()
            .filter_map(|field| map.get(*field))
            .find_map(|value| match value {
                Value::String(text) if !text.is_empty() => Some(text.clone()),
                Value::Null => None,
                Value::String(_) => None,
                other => Some(other.to_string()),
            })
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        Some(Value::Null) | None => "Unknown error".to_string(),
        Some(Value::String(_)) => "Unknown error".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_fallback_chain() {
        assert_eq!(error_message(Some(&json!("boom"))), "boom");
        assert_eq!(error_message(Some(&json!({"error": "quota"}))), "quota");
        assert_eq!(error_message(Some(&json!({"detail": "bad image"}))), "bad image");
        assert_eq!(error_message(Some(&json!({"code": 7}))), r#"{"code":7}"#);
        assert_eq!(error_message(None), "Unknown error");
    }

    #[test]
    fn pct_is_clamped() {
        let frame = parse_frame(r#"{"type":"step","step_id":"search","status":"start","pct":1.7}"#);
        match frame {
            Some(StreamFrame::Step { pct, .. }) => assert_eq!(pct, Some(1.0)),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_dropped() {
        assert_eq!(parse_frame(r#"{"type":"heartbeat"}"#), None);
        assert_eq!(parse_frame("{not json"), None);
        assert_eq!(parse_frame("   "), None);
    }
}
