use chrono::{DateTime, NaiveDateTime, Utc};

const MS_PER_HOUR: i64 = 1000 * 60 * 60;

/// Derived voting-window progress: a clamped percentage of elapsed time and a
/// human-readable remaining-time label.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
  pub percent: f64,
  pub label: String,
}

impl Progress {
  fn undefined() -> Self {
    Self { percent: 0.0, label: "Sem prazo definido".to_string() }
  }
}

/// Accepts both RFC 3339 and the naive ISO-8601 form FastAPI emits for UTC
/// datetimes. Anything else is treated as an undefined deadline upstream.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
  if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
    return Some(parsed.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|naive| naive.and_utc())
}

/// Maps a voting window and the evaluation instant to completion progress.
/// Total: never panics; degenerate windows (unparseable or start >= end)
/// collapse to 0% with no deadline label.
pub fn session_progress(starts_at: &str, ends_at: &str, now: DateTime<Utc>) -> Progress {
  let (start, end) = match (parse_timestamp(starts_at), parse_timestamp(ends_at)) {
    (Some(start), Some(end)) if start < end => (start, end),
    _ => return Progress::undefined(),
  };

  let now_ms = now.timestamp_millis();
  let start_ms = start.timestamp_millis();
  let end_ms = end.timestamp_millis();

  if now_ms <= start_ms {
    return Progress { percent: 0.0, label: format_remaining(start_ms - now_ms, true) };
  }

  let total = (end_ms - start_ms) as f64;
  let elapsed = (now_ms - start_ms) as f64;
  let remaining = (end_ms - now_ms).max(0);
  let percent = (elapsed / total * 100.0).clamp(0.0, 100.0);

  let label =
    if remaining == 0 { "Encerrada".to_string() } else { format_remaining(remaining, false) };
  Progress { percent, label }
}

/// Remaining-time wording: hours when under a day, whole days otherwise.
/// Both round up, so the display never understates the time left.
fn format_remaining(milliseconds: i64, is_future_start: bool) -> String {
  if milliseconds <= 0 {
    return if is_future_start { "Inicia em instantes".to_string() } else { "Encerrada".to_string() };
  }
  let verb = if is_future_start { "Inicia" } else { "Termina" };
  let hours = (milliseconds as u64).div_ceil(MS_PER_HOUR as u64);
  if hours < 24 {
    return format!("{verb} em {hours}h");
  }
  let days = hours.div_ceil(24);
  format!("{verb} em {days} dia{}", if days > 1 { "s" } else { "" })
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn at(value: &str) -> DateTime<Utc> {
    parse_timestamp(value).unwrap()
  }

  #[test]
  fn unparseable_window_is_undefined() {
    let progress = session_progress("nunca", "2025-03-08T00:00:00", Utc::now());
    assert_eq!(progress, Progress { percent: 0.0, label: "Sem prazo definido".to_string() });
  }

  #[test]
  fn inverted_or_empty_window_is_undefined() {
    let now = Utc::now();
    let inverted = session_progress("2025-03-08T00:00:00", "2025-03-01T00:00:00", now);
    assert_eq!(inverted.label, "Sem prazo definido");
    let empty = session_progress("2025-03-01T00:00:00", "2025-03-01T00:00:00", now);
    assert_eq!(empty.percent, 0.0);
  }

  #[test]
  fn zero_before_start() {
    let progress =
      session_progress("2025-03-01T00:00:00", "2025-03-08T00:00:00", at("2025-02-27T12:00:00"));
    assert_eq!(progress.percent, 0.0);
    // 36h remaining until start rounds up to 2 days.
    assert_eq!(progress.label, "Inicia em 2 dias");
  }

  #[test]
  fn future_start_under_a_day_renders_hours() {
    let progress =
      session_progress("2025-03-01T12:00:00", "2025-03-08T00:00:00", at("2025-03-01T02:30:00"));
    assert_eq!(progress.percent, 0.0);
    assert_eq!(progress.label, "Inicia em 10h");
  }

  #[test]
  fn closed_after_end() {
    let progress =
      session_progress("2025-03-01T00:00:00", "2025-03-08T00:00:00", at("2025-03-09T00:00:00"));
    assert_eq!(progress.percent, 100.0);
    assert_eq!(progress.label, "Encerrada");
  }

  #[test]
  fn one_day_into_a_week_long_window() {
    let progress =
      session_progress("2025-03-01T00:00:00", "2025-03-08T00:00:00", at("2025-03-02T00:00:00"));
    assert!((progress.percent - 100.0 / 7.0).abs() < 1e-9);
    // Exactly 144h remain: hours >= 24, ceil(144 / 24) = 6.
    assert_eq!(progress.label, "Termina em 6 dias");
  }

  #[test]
  fn partial_remaining_day_rounds_up() {
    let progress =
      session_progress("2025-03-01T00:00:00", "2025-03-08T00:00:00", at("2025-03-01T23:59:00"));
    // 144h 1min remaining: ceil to 145h, ceil(145 / 24) = 7 days.
    assert_eq!(progress.label, "Termina em 7 dias");
  }

  #[test]
  fn last_hours_render_in_hours() {
    let progress =
      session_progress("2025-03-01T00:00:00", "2025-03-08T00:00:00", at("2025-03-07T20:15:00"));
    assert_eq!(progress.label, "Termina em 4h");
  }

  #[test]
  fn percent_is_monotonic_over_the_window() {
    let start = at("2025-03-01T00:00:00");
    let mut previous = -1.0;
    for hour in 0 ..= 24 * 7 {
      let now = start + Duration::hours(hour);
      let progress = session_progress("2025-03-01T00:00:00", "2025-03-08T00:00:00", now);
      assert!(progress.percent >= previous, "regressed at hour {hour}");
      previous = progress.percent;
    }
    assert_eq!(previous, 100.0);
  }

  #[test]
  fn rfc3339_timestamps_parse_too() {
    let now = Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap();
    let progress =
      session_progress("2025-03-01T00:00:00Z", "2025-03-08T00:00:00+00:00", now);
    assert!(progress.percent > 0.0 && progress.percent < 100.0);
  }
}
