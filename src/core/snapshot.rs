//! Snapshot data model and normalization.
//!
//! The external service command prints one JSON document describing
//! per-provider usage. These types mirror that payload with every optional
//! field kept optional: "absent" and "zero" mean different things downstream
//! (an absent window renders "n/a", a 0%-used window renders a bar), so
//! nothing here defaults missing numbers to zero.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{QuotabarError, Result};

/// Provider id used when an entry carries no usable provider field, and the
/// final fallback of the selection policy.
pub const DEFAULT_PROVIDER: &str = "codex";

// =============================================================================
// Root payload
// =============================================================================

/// One point-in-time payload describing usage across providers.
///
/// A snapshot with zero entries is valid and means "no data", not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetSnapshot {
    pub generated_at: String,
    pub enabled_providers: Vec<String>,
    pub entries: Vec<ProviderEntry>,
}

impl WidgetSnapshot {
    /// Parse the service command's stdout into a normalized snapshot.
    ///
    /// Empty or whitespace-only input is the distinct "no output" condition,
    /// not a parse failure. Unknown fields are ignored; missing optional
    /// fields stay absent. Provider ids come out lowercased and trimmed,
    /// with empty ids defaulting to [`DEFAULT_PROVIDER`].
    ///
    /// # Errors
    ///
    /// `NoOutput` for empty input, `MalformedOutput` for anything that does
    /// not decode as the snapshot schema.
    pub fn normalize(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuotabarError::NoOutput { stderr: None });
        }

        let mut snapshot: Self = serde_json::from_str(trimmed).map_err(|e| {
            QuotabarError::MalformedOutput {
                message: e.to_string(),
            }
        })?;

        for entry in &mut snapshot.entries {
            entry.provider = normalize_provider_id(&entry.provider);
        }
        snapshot.enabled_providers = snapshot
            .enabled_providers
            .iter()
            .map(|id| id.trim().to_lowercase())
            .filter(|id| !id.is_empty())
            .collect();

        Ok(snapshot)
    }

    /// Entry for the given (already normalized) provider id, if present.
    #[must_use]
    pub fn entry_for(&self, provider_id: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.provider == provider_id)
    }

    /// Built-in sample payload, used by `quotabar --sample` and as a test
    /// fixture.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            generated_at: now_timestamp(),
            enabled_providers: vec!["codex".to_string(), "claude".to_string()],
            entries: vec![
                ProviderEntry {
                    provider: "codex".to_string(),
                    source: "openai-web".to_string(),
                    updated_at: now_timestamp(),
                    primary: Some(UsageWindow {
                        used_percent: Some(28.0),
                        window_minutes: Some(300.0),
                        resets_at: Some("2026-02-11T20:00:00Z".to_string()),
                    }),
                    secondary: Some(UsageWindow {
                        used_percent: Some(61.0),
                        window_minutes: Some(10080.0),
                        resets_at: Some("2026-02-14T20:00:00Z".to_string()),
                    }),
                    tertiary: None,
                    credits_remaining: Some(92.4),
                    code_review_remaining_percent: Some(100.0),
                    identity: Some(IdentityInfo {
                        account_email: Some("codex@example.com".to_string()),
                        account_organization: None,
                        login_method: Some("plus".to_string()),
                    }),
                    status: Some(StatusInfo {
                        indicator: Some("none".to_string()),
                        description: Some("Operational".to_string()),
                        updated_at: Some(now_timestamp()),
                        url: Some("https://status.openai.com/".to_string()),
                    }),
                },
                ProviderEntry {
                    provider: "claude".to_string(),
                    source: "oauth".to_string(),
                    updated_at: now_timestamp(),
                    primary: Some(UsageWindow {
                        used_percent: Some(41.0),
                        window_minutes: Some(300.0),
                        resets_at: Some("2026-02-11T23:30:00Z".to_string()),
                    }),
                    secondary: Some(UsageWindow {
                        used_percent: Some(54.0),
                        window_minutes: Some(10080.0),
                        resets_at: Some("2026-02-16T01:00:00Z".to_string()),
                    }),
                    tertiary: None,
                    credits_remaining: None,
                    code_review_remaining_percent: None,
                    identity: Some(IdentityInfo {
                        account_email: Some("claude@example.com".to_string()),
                        account_organization: None,
                        login_method: Some("max".to_string()),
                    }),
                    status: Some(StatusInfo {
                        indicator: Some("none".to_string()),
                        description: Some("Operational".to_string()),
                        updated_at: Some(now_timestamp()),
                        url: Some("https://status.anthropic.com/".to_string()),
                    }),
                },
            ],
        }
    }
}

// =============================================================================
// Per-provider entry
// =============================================================================

/// One provider's slice of a snapshot. Replaced whole on every refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderEntry {
    pub provider: String,
    pub source: String,
    pub updated_at: String,
    pub primary: Option<UsageWindow>,
    pub secondary: Option<UsageWindow>,
    pub tertiary: Option<UsageWindow>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub credits_remaining: Option<f64>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub code_review_remaining_percent: Option<f64>,
    pub identity: Option<IdentityInfo>,
    pub status: Option<StatusInfo>,
}

impl ProviderEntry {
    /// Synthesized all-empty entry for a provider with no data in the
    /// current snapshot. Guarantees presentation code never sees "absent".
    #[must_use]
    pub fn empty(provider_id: &str) -> Self {
        Self {
            provider: provider_id.to_string(),
            ..Self::default()
        }
    }
}

/// One metered quota window (session, weekly, etc.).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageWindow {
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub used_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub window_minutes: Option<f64>,
    pub resets_at: Option<String>,
}

/// Account identity reported by the service command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityInfo {
    pub account_email: Option<String>,
    pub account_organization: Option<String>,
    pub login_method: Option<String>,
}

/// Provider status page payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusInfo {
    pub indicator: Option<String>,
    pub description: Option<String>,
    pub updated_at: Option<String>,
    pub url: Option<String>,
}

impl StatusInfo {
    /// Human label for the statuspage-style indicator string.
    #[must_use]
    pub fn indicator_label(&self) -> &'static str {
        match self
            .indicator
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "" | "none" | "operational" => "Operational",
            "minor" => "Minor Issue",
            "major" => "Major Issue",
            "critical" => "Critical",
            "maintenance" | "under_maintenance" => "Maintenance",
            _ => "Unknown",
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Lowercase/trim a provider id, defaulting empty to [`DEFAULT_PROVIDER`].
#[must_use]
pub fn normalize_provider_id(raw: &str) -> String {
    let id = raw.trim().to_lowercase();
    if id.is_empty() {
        DEFAULT_PROVIDER.to_string()
    } else {
        id
    }
}

/// Current time as a `unix:<seconds>` stamp, the service command's native
/// timestamp format.
#[must_use]
pub fn now_timestamp() -> String {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => format!("unix:{}", duration.as_secs()),
        Err(_) => "unix:0".to_string(),
    }
}

/// Accept numbers or numeric strings; anything else decodes to `None`.
fn lenient_opt_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_f64))
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_no_output_not_parse_error() {
        assert!(matches!(
            WidgetSnapshot::normalize(""),
            Err(QuotabarError::NoOutput { .. })
        ));
        assert!(matches!(
            WidgetSnapshot::normalize("   \n\t"),
            Err(QuotabarError::NoOutput { .. })
        ));
    }

    #[test]
    fn invalid_json_is_malformed_output() {
        assert!(matches!(
            WidgetSnapshot::normalize("{not json"),
            Err(QuotabarError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn zero_entries_is_valid_no_data() {
        let snapshot = WidgetSnapshot::normalize(r#"{"generatedAt":"","entries":[]}"#).unwrap();
        assert!(snapshot.entries.is_empty());
        assert!(snapshot.generated_at.is_empty());
    }

    #[test]
    fn provider_ids_are_normalized() {
        let snapshot = WidgetSnapshot::normalize(
            r#"{"entries":[{"provider":" CLAUDE "},{"provider":""}],"enabledProviders":["Codex","","GEMINI"]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.entries[0].provider, "claude");
        assert_eq!(snapshot.entries[1].provider, "codex");
        assert_eq!(snapshot.enabled_providers, vec!["codex", "gemini"]);
    }

    #[test]
    fn unknown_fields_are_ignored_and_optionals_stay_absent() {
        let snapshot = WidgetSnapshot::normalize(
            r#"{"schemaVersion":9,"entries":[{"provider":"codex","primary":{"usedPercent":0},"futureField":true}]}"#,
        )
        .unwrap();
        let entry = &snapshot.entries[0];
        // 0 is present, not absent.
        assert_eq!(
            entry.primary.as_ref().and_then(|w| w.used_percent),
            Some(0.0)
        );
        assert!(entry.secondary.is_none());
        assert!(entry.credits_remaining.is_none());
    }

    #[test]
    fn numeric_strings_decode_leniently() {
        let snapshot = WidgetSnapshot::normalize(
            r#"{"entries":[{"provider":"codex","primary":{"usedPercent":"30","windowMinutes":"300"},"creditsRemaining":"100.5"}]}"#,
        )
        .unwrap();
        let entry = &snapshot.entries[0];
        let primary = entry.primary.as_ref().unwrap();
        assert_eq!(primary.used_percent, Some(30.0));
        assert_eq!(primary.window_minutes, Some(300.0));
        assert_eq!(entry.credits_remaining, Some(100.5));
    }

    #[test]
    fn non_numeric_junk_decodes_to_absent() {
        let snapshot = WidgetSnapshot::normalize(
            r#"{"entries":[{"provider":"codex","primary":{"usedPercent":"lots"}}]}"#,
        )
        .unwrap();
        let primary = snapshot.entries[0].primary.as_ref().unwrap();
        assert!(primary.used_percent.is_none());
    }

    #[test]
    fn round_trip_preserves_providers_and_numbers() {
        let sample = WidgetSnapshot::sample();
        let json = serde_json::to_string(&sample).unwrap();
        let back = WidgetSnapshot::normalize(&json).unwrap();

        let ids: Vec<&str> = back.entries.iter().map(|e| e.provider.as_str()).collect();
        assert_eq!(ids, vec!["codex", "claude"]);
        assert_eq!(
            back.entries[0].primary.as_ref().unwrap().used_percent,
            sample.entries[0].primary.as_ref().unwrap().used_percent
        );
        assert_eq!(back.entries[0].credits_remaining, Some(92.4));
    }

    #[test]
    fn synthesized_entry_is_all_empty() {
        let entry = ProviderEntry::empty("claude");
        assert_eq!(entry.provider, "claude");
        assert!(entry.primary.is_none());
        assert!(entry.identity.is_none());
        assert!(entry.source.is_empty());
    }

    #[test]
    fn status_indicator_labels() {
        let mut status = StatusInfo::default();
        assert_eq!(status.indicator_label(), "Operational");
        status.indicator = Some("minor".to_string());
        assert_eq!(status.indicator_label(), "Minor Issue");
        status.indicator = Some("garbage".to_string());
        assert_eq!(status.indicator_label(), "Unknown");
    }
}
