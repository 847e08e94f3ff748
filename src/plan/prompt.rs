use std::fmt::Write;

use crate::models::{
    port::Port, preferences::Preferences, trip::Trip, weather::WeatherSnapshot,
};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert cruise port day planner. \
You always respond with valid JSON only, no markdown.";

/// The JSON shape the model is told to return. Embedded verbatim in the
/// prompt so the validator and the model agree on field names and types.
const RESPONSE_SCHEMA: &str = r#"{
  "activities": [
    {
      "order": <integer, 1-based position in the day>,
      "name": <string>,
      "description": <string, 1-2 sentences>,
      "start_time": <string, 24h "HH:MM">,
      "end_time": <string, 24h "HH:MM">,
      "duration_minutes": <integer>,
      "location": <string, short label>,
      "latitude": <number, optional>,
      "longitude": <number, optional>,
      "cost_estimate": <string, amount with currency, e.g. "15-20 EUR">,
      "booking_url": <string, optional, only for bookable tours>,
      "tips": <string, optional>,
      "transport_to_next": <string, optional, omit on the last activity>,
      "travel_time_to_next": <integer minutes, optional, omit on the last activity>
    }
  ]
}"#;

/// Renders the generation prompt. Deterministic: identical inputs yield an
/// identical string, so a regeneration with unchanged data reproduces the
/// exact request.
pub fn render(
    trip: &Trip,
    port: &Port,
    preferences: &Preferences,
    weather: Option<&WeatherSnapshot>,
) -> String {
    let visit_minutes = (port.departure_time - port.arrival_time).num_minutes();
    let hours = visit_minutes / 60;
    let minutes = visit_minutes % 60;
    let target = suggested_activity_count(visit_minutes, preferences);

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Plan one day ashore in {}, {} for passengers of the cruise ship \"{}\".",
        port.name, port.country, trip.ship_name
    );
    let _ = writeln!(
        prompt,
        "The ship docks at latitude {:.4}, longitude {:.4}.",
        port.latitude, port.longitude
    );
    let _ = writeln!(
        prompt,
        "Date: {}. All aboard window: arrival {} to departure {} ({}h {:02}m in port).",
        port.arrival_time.date(),
        port.arrival_time.time().format("%H:%M"),
        port.departure_time.time().format("%H:%M"),
        hours,
        minutes
    );
    prompt.push('\n');

    let _ = writeln!(prompt, "The travellers are {}.", preferences.party_type.label());
    let _ = writeln!(prompt, "Pace: {}.", preferences.activity_level.label());
    let _ = writeln!(prompt, "They get around by {}.", preferences.transport_mode.label());
    let _ = writeln!(
        prompt,
        "They have {}; quote costs in {}.",
        preferences.budget.label(),
        preferences.currency
    );

    if let Some(weather) = weather {
        let _ = writeln!(
            prompt,
            "Forecast for the day: {}, {:.0}-{:.0} degrees C{}.",
            weather.summary,
            weather.temperature_min,
            weather.temperature_max,
            match weather.precipitation_chance {
                Some(chance) => format!(", {chance}% chance of precipitation"),
                None => String::new(),
            }
        );
    }

    prompt.push('\n');
    let _ = writeln!(prompt, "Rules:");
    let _ = writeln!(
        prompt,
        "- The day starts and ends at the cruise terminal; the first activity must \
         start at or after {} and the last must end at or before {}.",
        port.arrival_time.time().format("%H:%M"),
        port.departure_time.time().format("%H:%M")
    );
    let _ = writeln!(
        prompt,
        "- Aim for about {target} activities, sized to the time in port and the pace."
    );
    let _ = writeln!(prompt, "- Activities must not overlap and must be in chronological order.");
    let _ = writeln!(
        prompt,
        "- Leave enough slack to be back at the terminal comfortably before departure."
    );

    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "Respond with a single JSON object exactly matching this schema:"
    );
    prompt.push_str(RESPONSE_SCHEMA);
    prompt
}

/// Activity count scales with the visit duration and the requested pace.
fn suggested_activity_count(visit_minutes: i64, preferences: &Preferences) -> i64 {
    (visit_minutes / preferences.activity_level.minutes_per_activity()).clamp(2, 10)
}
