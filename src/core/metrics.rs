//! Pure metric derivation over snapshot entries.
//!
//! Every "absent vs. zero vs. invalid" decision lives here rather than being
//! scattered through presentation code: each function is total, defines a
//! safe default for missing data, and never panics.

use chrono::{DateTime, Utc};

use crate::core::snapshot::{ProviderEntry, UsageWindow};

// =============================================================================
// Usage percentages
// =============================================================================

/// Whether a window carries meaningful usage: `used_percent` present and a
/// finite number. Out-of-range values still count; clamping happens in
/// [`used_percent`].
#[must_use]
pub fn has_usage(window: Option<&UsageWindow>) -> bool {
    window
        .and_then(|w| w.used_percent)
        .is_some_and(f64::is_finite)
}

/// Used percentage clamped to [0, 100]; 0 when the window has no usage.
#[must_use]
pub fn used_percent(window: Option<&UsageWindow>) -> f64 {
    if has_usage(window) {
        window
            .and_then(|w| w.used_percent)
            .unwrap_or(0.0)
            .clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Remaining percentage, clamped to [0, 100].
#[must_use]
pub fn remaining_percent(window: Option<&UsageWindow>) -> f64 {
    (100.0 - used_percent(window)).clamp(0.0, 100.0)
}

/// Whether an entry carries any usage data at all, independent of
/// transport-level errors. Drives the "no usage data" presentation state.
#[must_use]
pub fn has_any_usage_data(entry: &ProviderEntry) -> bool {
    has_usage(entry.primary.as_ref())
        || has_usage(entry.secondary.as_ref())
        || has_usage(entry.tertiary.as_ref())
        || entry
            .code_review_remaining_percent
            .is_some_and(|p| p.is_finite() && (0.0..=100.0).contains(&p))
        || entry.credits_remaining.is_some_and(f64::is_finite)
}

// =============================================================================
// Severity
// =============================================================================

/// Color theme of the host widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Three-tier severity by used percentage: <70 low, 70-89 medium, >=90 high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify a window. Absent usage is low severity (0%).
    #[must_use]
    pub fn of(window: Option<&UsageWindow>) -> Self {
        let used = used_percent(window);
        if used >= 90.0 {
            Self::High
        } else if used >= 70.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Theme-dependent hex color. Thresholds do not vary by theme.
    #[must_use]
    pub const fn color(self, theme: Theme) -> &'static str {
        match (self, theme) {
            (Self::Low, Theme::Dark) => "#81c784",
            (Self::Low, Theme::Light) => "#2e7d32",
            (Self::Medium, Theme::Dark) => "#ffb74d",
            (Self::Medium, Theme::Light) => "#e65100",
            (Self::High, Theme::Dark) => "#e57373",
            (Self::High, Theme::Light) => "#c62828",
        }
    }
}

// =============================================================================
// Window labels
// =============================================================================

/// Short label for a window's duration: 300 -> "5h", 10080 -> "7d", whole
/// days -> "{d}d", whole hours -> "{h}h", else "{m}m". Absent or
/// non-positive durations yield `fallback`.
#[must_use]
pub fn window_label(window: Option<&UsageWindow>, fallback: &str) -> String {
    let Some(minutes) = window.and_then(|w| w.window_minutes) else {
        return fallback.to_string();
    };
    if !minutes.is_finite() || minutes <= 0.0 {
        return fallback.to_string();
    }

    #[allow(clippy::cast_possible_truncation)]
    let minutes = minutes.round() as i64;
    if minutes <= 0 {
        return fallback.to_string();
    }

    match minutes {
        300 => "5h".to_string(),
        10080 => "7d".to_string(),
        m if m % 1440 == 0 => format!("{}d", m / 1440),
        m if m % 60 == 0 => format!("{}h", m / 60),
        m => format!("{m}m"),
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Parse a service timestamp: either a `unix:<seconds>` literal or an
/// RFC 3339 date string. Anything else is unparseable (`None`), never a
/// panic.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(seconds) = trimmed.strip_prefix("unix:") {
        let seconds = seconds.trim().parse::<f64>().ok()?;
        if !seconds.is_finite() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        return DateTime::<Utc>::from_timestamp(seconds as i64, 0);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Relative-time label bucketed by absolute delta: <45s "just now", <1h
/// minutes, <24h hours, else days; "ago" for the past, "in" for the future.
/// `None` when the timestamp does not parse.
#[must_use]
pub fn relative_label(raw: &str, now: DateTime<Utc>) -> Option<String> {
    let timestamp = parse_timestamp(raw)?;
    let delta_seconds = now.signed_duration_since(timestamp).num_seconds();
    let past = delta_seconds >= 0;
    let abs = delta_seconds.unsigned_abs();

    if abs < 45 {
        return Some("just now".to_string());
    }

    let (value, unit) = if abs < 3600 {
        (abs.div_ceil(60).clamp(1, 59), "m")
    } else if abs < 86_400 {
        (abs / 3600, "h")
    } else {
        (abs / 86_400, "d")
    };

    Some(if past {
        format!("{value}{unit} ago")
    } else {
        format!("in {value}{unit}")
    })
}

/// Countdown to a window's reset: "Resets unknown" when `resets_at` is
/// absent or unparseable, "Resetting soon" once due, else "Resets in ..."
/// with a day/hour/minute breakdown and a "<1m" floor.
#[must_use]
pub fn reset_countdown(window: Option<&UsageWindow>, now: DateTime<Utc>) -> String {
    let Some(target) = window
        .and_then(|w| w.resets_at.as_deref())
        .and_then(parse_timestamp)
    else {
        return "Resets unknown".to_string();
    };

    let remaining = target.signed_duration_since(now).num_seconds();
    if remaining <= 0 {
        return "Resetting soon".to_string();
    }

    let days = remaining / 86_400;
    let hours = (remaining % 86_400) / 3600;
    let minutes = (remaining % 3600) / 60;

    let duration = if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        "<1m".to_string()
    };

    format!("Resets in {duration}")
}
