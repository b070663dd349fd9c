use std::time::Duration;

use jiff::SpanRelativeTo;

/// Accepts `10s`, ISO 8601 durations such as `PT15S`, or plain seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration.unsigned_abs());
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration.unsigned_abs());
    }

    if let Ok(seconds) = input.parse::<f64>() {
        if seconds.is_finite() {
            return Ok(Duration::from_secs_f64(seconds.abs()));
        }
    }

    Err(String::from("Invalid duration"))
}

pub fn parse_fps(input: &str) -> Result<u32, String> {
    match input.parse::<u32>() {
        Ok(fps) if (1..=240).contains(&fps) => Ok(fps),
        _ => Err(String::from("Frame rate must be between 1 and 240")),
    }
}
