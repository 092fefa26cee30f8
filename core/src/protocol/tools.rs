//! The optional `get_recent_history` tool.

use serde_json::{json, Value};

use super::types::ToolDescriptor;
use crate::history::DayLog;

pub const GET_RECENT_HISTORY: &str = "get_recent_history";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: GET_RECENT_HISTORY.to_string(),
        description: "Retrieve recent conversation history".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "number",
                    "description": "Number of days to look back",
                    "default": DEFAULT_LOOKBACK_DAYS
                }
            }
        }),
    }]
}

/// Reads `days` from the tool arguments. Fractions round down.
pub fn lookback_days(arguments: Option<&Value>) -> Result<u32, String> {
    let Some(raw) = arguments.and_then(|args| args.get("days")) else {
        return Ok(DEFAULT_LOOKBACK_DAYS);
    };
    if raw.is_null() {
        return Ok(DEFAULT_LOOKBACK_DAYS);
    }
    match raw.as_f64() {
        Some(days) if days.is_finite() && days >= 0.0 => Ok(days.floor().min(u32::MAX as f64) as u32),
        _ => Err(format!("'days' must be a non-negative number, got {raw}")),
    }
}

pub fn render_recent(logs: &[DayLog], days: u32) -> String {
    if logs.is_empty() {
        return format!("No history recorded in the last {days} day(s)");
    }
    logs.iter()
        .map(|log| format!("# {}\n{}", log.date, log.contents))
        .collect::<Vec<_>>()
        .join("\n")
}
