//! Static provider metadata and capability tables.
//!
//! Provider behavior is data, not branching logic: adding a provider means
//! adding a table row. All lookups resolve case-insensitively through the
//! same id normalization the snapshot model uses, and unknown providers get
//! an all-empty record rather than an error.

use crate::core::snapshot::{ProviderEntry, normalize_provider_id};

/// Static metadata for one provider. Compiled in; never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub dashboard_url: &'static str,
    pub status_page_url: &'static str,
    /// Secondary/alternate status reference.
    pub status_link_url: &'static str,
    /// Used instead of `dashboard_url` when the entry's login method
    /// indicates a paid tier.
    pub subscription_dashboard_url: &'static str,
}

const EMPTY_METADATA: ProviderMetadata = ProviderMetadata {
    dashboard_url: "",
    status_page_url: "",
    status_link_url: "",
    subscription_dashboard_url: "",
};

const METADATA_TABLE: &[(&str, ProviderMetadata)] = &[
    (
        "codex",
        ProviderMetadata {
            dashboard_url: "https://platform.openai.com/usage",
            status_page_url: "https://status.openai.com",
            status_link_url: "",
            subscription_dashboard_url: "",
        },
    ),
    (
        "claude",
        ProviderMetadata {
            dashboard_url: "https://claude.ai/settings/usage",
            status_page_url: "https://status.anthropic.com",
            status_link_url: "https://status.claude.com",
            subscription_dashboard_url: "https://claude.ai/settings/subscription",
        },
    ),
    (
        "gemini",
        ProviderMetadata {
            dashboard_url: "https://aistudio.google.com",
            status_page_url: "https://status.cloud.google.com",
            status_link_url: "",
            subscription_dashboard_url: "",
        },
    ),
    (
        "cursor",
        ProviderMetadata {
            dashboard_url: "https://cursor.com/settings",
            status_page_url: "https://status.cursor.com",
            status_link_url: "",
            subscription_dashboard_url: "",
        },
    ),
    (
        "copilot",
        ProviderMetadata {
            dashboard_url: "https://github.com/settings/copilot",
            status_page_url: "https://www.githubstatus.com",
            status_link_url: "",
            subscription_dashboard_url: "",
        },
    ),
];

/// Paid-tier markers in `identity.login_method` that switch the dashboard
/// to the subscription-specific URL.
const SUBSCRIPTION_TIER_MARKERS: &[&str] = &["max", "pro", "ultra", "team"];

/// Providers whose login action control is shown at all.
const LOGIN_CAPABLE: &[&str] = &["codex", "claude", "gemini"];

/// Resolved login action for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAction {
    /// Run this command in a terminal emulator.
    Terminal(&'static str),
    /// Open this URL externally.
    Url(&'static str),
}

const LOGIN_ACTIONS: &[(&str, LoginAction)] = &[
    ("codex", LoginAction::Terminal("codex login")),
    ("claude", LoginAction::Terminal("claude /login")),
    ("gemini", LoginAction::Url("https://aistudio.google.com/")),
];

/// Static metadata for a provider id; all-empty for unknown providers.
#[must_use]
pub fn metadata_for(provider_id: &str) -> ProviderMetadata {
    let id = normalize_provider_id(provider_id);
    METADATA_TABLE
        .iter()
        .find(|(key, _)| *key == id)
        .map_or(EMPTY_METADATA, |(_, metadata)| *metadata)
}

/// Fixed allow-list, independent of the metadata table.
#[must_use]
pub fn supports_login(provider_id: &str) -> bool {
    let id = normalize_provider_id(provider_id);
    LOGIN_CAPABLE.contains(&id.as_str())
}

/// Login action for a provider, if one is known.
#[must_use]
pub fn login_action(provider_id: &str) -> Option<LoginAction> {
    let id = normalize_provider_id(provider_id);
    LOGIN_ACTIONS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, action)| *action)
}

/// Dashboard URL with the paid-tier override: when the entry's login method
/// names a subscription tier and the provider has a subscription dashboard
/// configured, that URL wins.
#[must_use]
pub fn dashboard_url_for(provider_id: &str, entry: &ProviderEntry) -> String {
    let metadata = metadata_for(provider_id);

    if !metadata.subscription_dashboard_url.is_empty() {
        let login_method = entry
            .identity
            .as_ref()
            .and_then(|identity| identity.login_method.as_deref())
            .unwrap_or("")
            .to_lowercase();
        if SUBSCRIPTION_TIER_MARKERS
            .iter()
            .any(|marker| login_method.contains(marker))
        {
            return metadata.subscription_dashboard_url.to_string();
        }
    }

    metadata.dashboard_url.to_string()
}

/// Status page URL, preferring the entry's own status object over the
/// static table, then the primary status page, then the alternate link.
#[must_use]
pub fn status_page_url_for(provider_id: &str, entry: &ProviderEntry) -> String {
    if let Some(url) = entry
        .status
        .as_ref()
        .and_then(|status| status.url.as_deref())
        .filter(|url| !url.trim().is_empty())
    {
        return url.to_string();
    }

    let metadata = metadata_for(provider_id);
    if !metadata.status_page_url.is_empty() {
        metadata.status_page_url.to_string()
    } else {
        metadata.status_link_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::{IdentityInfo, StatusInfo};

    fn entry_with_login_method(method: &str) -> ProviderEntry {
        let mut entry = ProviderEntry::empty("claude");
        entry.identity = Some(IdentityInfo {
            account_email: None,
            account_organization: None,
            login_method: Some(method.to_string()),
        });
        entry
    }

    #[test]
    fn lookup_is_case_insensitive_and_total() {
        assert_eq!(metadata_for("CLAUDE"), metadata_for("claude"));
        assert_eq!(metadata_for("no-such-provider"), EMPTY_METADATA);
        // Empty ids normalize to codex, which has metadata.
        assert!(!metadata_for("").dashboard_url.is_empty());
    }

    #[test]
    fn login_capability_allow_list() {
        assert!(supports_login("codex"));
        assert!(supports_login(" Claude "));
        assert!(!supports_login("cursor"));
        assert!(!supports_login("no-such-provider"));
    }

    #[test]
    fn login_actions_cover_both_kinds() {
        assert!(matches!(
            login_action("codex"),
            Some(LoginAction::Terminal("codex login"))
        ));
        assert!(matches!(login_action("gemini"), Some(LoginAction::Url(_))));
        assert!(login_action("cursor").is_none());
    }

    #[test]
    fn paid_tier_switches_claude_dashboard() {
        let free = entry_with_login_method("oauth");
        assert_eq!(
            dashboard_url_for("claude", &free),
            "https://claude.ai/settings/usage"
        );

        for method in ["max", "Claude Pro", "ULTRA", "team plan"] {
            let paid = entry_with_login_method(method);
            assert_eq!(
                dashboard_url_for("claude", &paid),
                "https://claude.ai/settings/subscription",
                "login method {method:?} should hit the subscription dashboard"
            );
        }
    }

    #[test]
    fn paid_tier_does_not_affect_other_providers() {
        let mut entry = entry_with_login_method("pro");
        entry.provider = "codex".to_string();
        assert_eq!(
            dashboard_url_for("codex", &entry),
            "https://platform.openai.com/usage"
        );
    }

    #[test]
    fn status_url_prefers_entry_payload() {
        let mut entry = ProviderEntry::empty("claude");
        entry.status = Some(StatusInfo {
            indicator: None,
            description: None,
            updated_at: None,
            url: Some("https://example.com/status".to_string()),
        });
        assert_eq!(
            status_page_url_for("claude", &entry),
            "https://example.com/status"
        );

        entry.status = None;
        assert_eq!(
            status_page_url_for("claude", &entry),
            "https://status.anthropic.com"
        );

        let unknown = ProviderEntry::empty("mystery");
        assert_eq!(status_page_url_for("mystery", &unknown), "");
    }
}
