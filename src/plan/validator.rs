use chrono::{NaiveDateTime, NaiveTime};
use serde_json::Value;
use thiserror::Error;

use crate::models::plan::Activity;

/// Why a model response could not be repaired into a valid plan. The
/// orchestrator maps every variant to `ai_service_invalid_response`.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no JSON object found in the response")]
    NoJson,
    #[error("response is not valid JSON: {0}")]
    Malformed(String),
    #[error("response shape is invalid: {0}")]
    Shape(String),
    #[error("no activities fall within the visit window")]
    EmptyPlan,
}

/// Parses a raw model response into the activities of a day plan.
///
/// The model may wrap its JSON in markdown fences, surround it with prose,
/// emit numbers as strings, leave `order` values non-contiguous, or place
/// activities outside the visit window. Everything repairable is repaired;
/// anything else is a `ValidationError`. This is the last line of defense
/// before persistence: the returned activities always satisfy the plan
/// invariants (contiguous 1-based order, non-overlapping windows inside
/// [arrival, departure]).
pub fn parse_plan(
    raw: &str,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
) -> Result<Vec<Activity>, ValidationError> {
    let json_text = extract_json(raw).ok_or(ValidationError::NoJson)?;
    let repaired = strip_trailing_commas(json_text);
    let root: Value = serde_json::from_str(&repaired)
        .map_err(|err| ValidationError::Malformed(err.to_string()))?;

    let items = match &root {
        Value::Object(map) => map
            .get("activities")
            .ok_or_else(|| ValidationError::Shape("missing \"activities\" field".into()))?
            .as_array()
            .ok_or_else(|| ValidationError::Shape("\"activities\" is not an array".into()))?,
        // Some models return the bare array; tolerate it.
        Value::Array(items) => items,
        _ => return Err(ValidationError::Shape("response is not an object".into())),
    };

    let mut parsed: Vec<(i64, usize, Activity)> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(ValidationError::Shape(format!(
                "activity {index} is not an object"
            )));
        };
        if let Some(activity) = parse_activity(fields) {
            let emitted_order = fields
                .get("order")
                .and_then(as_i64)
                .unwrap_or(i64::MAX);
            parsed.push((emitted_order, index, activity));
        }
    }

    // Stable sort on the emitted order keeps the model's relative ordering
    // even when the numbers themselves are garbage.
    parsed.sort_by_key(|(order, index, _)| (*order, *index));

    let window_start = arrival.time();
    let window_end = if departure.date() > arrival.date() {
        NaiveTime::from_hms_opt(23, 59, 59).expect("valid time")
    } else {
        departure.time()
    };

    let mut activities: Vec<Activity> = Vec::new();
    for (_, _, mut activity) in parsed {
        if activity.end_time < activity.start_time {
            continue;
        }
        // Clip to the visit window; drop what the window cannot hold.
        if activity.start_time < window_start {
            activity.start_time = window_start;
        }
        if activity.end_time > window_end {
            activity.end_time = window_end;
        }
        if activity.start_time >= activity.end_time {
            continue;
        }
        // Resolve overlaps by pushing the start to the previous end.
        if let Some(previous) = activities.last() {
            if activity.start_time < previous.end_time {
                activity.start_time = previous.end_time;
                if activity.start_time >= activity.end_time {
                    continue;
                }
            }
        }
        activity.duration_minutes =
            (activity.end_time - activity.start_time).num_minutes().max(0) as u32;
        activities.push(activity);
    }

    if activities.is_empty() {
        return Err(ValidationError::EmptyPlan);
    }

    for (index, activity) in activities.iter_mut().enumerate() {
        activity.order = index as u32 + 1;
    }
    if let Some(last) = activities.last_mut() {
        last.transport_to_next = None;
        last.travel_time_to_next = None;
    }

    Ok(activities)
}

/// One activity from the model, or None when it is missing a field we
/// cannot invent (name or a parseable time window).
fn parse_activity(fields: &serde_json::Map<String, Value>) -> Option<Activity> {
    let name = fields.get("name").and_then(as_string)?;
    if name.trim().is_empty() {
        return None;
    }
    let start_time = fields.get("start_time").and_then(as_time)?;
    let end_time = fields.get("end_time").and_then(as_time)?;

    Some(Activity {
        // Placeholder; contiguous values are assigned after sorting.
        order: 0,
        name,
        description: fields
            .get("description")
            .and_then(as_string)
            .unwrap_or_default(),
        start_time,
        end_time,
        duration_minutes: fields
            .get("duration_minutes")
            .and_then(as_u32)
            .unwrap_or(0),
        location: fields.get("location").and_then(as_string).unwrap_or_default(),
        latitude: fields.get("latitude").and_then(as_f64),
        longitude: fields.get("longitude").and_then(as_f64),
        cost_estimate: fields
            .get("cost_estimate")
            .and_then(as_string)
            .unwrap_or_else(|| "free".to_string()),
        booking_url: fields
            .get("booking_url")
            .and_then(as_string)
            .filter(|url| !url.trim().is_empty()),
        tips: fields.get("tips").and_then(as_string),
        transport_to_next: fields.get("transport_to_next").and_then(as_string),
        travel_time_to_next: fields.get("travel_time_to_next").and_then(as_u32),
    })
}

/// Locates the first balanced JSON object (or array) in free text,
/// skipping fences, prose and anything after the closing delimiter.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drops commas that directly precede a closing brace/bracket — the most
/// common malformation a JSON-promising model still produces.
fn strip_trailing_commas(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = text.chars().collect();
    for (index, &ch) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            output.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => {
                escaped = true;
                output.push(ch);
            }
            '"' => {
                in_string = !in_string;
                output.push(ch);
            }
            ',' if !in_string => {
                let next = chars[index + 1..]
                    .iter()
                    .find(|candidate| !candidate.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    output.push(ch);
                }
            }
            _ => output.push(ch),
        }
    }
    output
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    as_i64(value).and_then(|number| u32::try_from(number).ok())
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_time(value: &Value) -> Option<NaiveTime> {
    let text = match value {
        Value::String(text) => text.trim().to_uppercase(),
        _ => return None,
    };
    for format in ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"] {
        if let Ok(time) = NaiveTime::parse_from_str(&text, format) {
            return Some(time);
        }
    }
    None
}
