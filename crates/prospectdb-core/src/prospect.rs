//! Shared prospect domain types: lifecycle status, company-size tiers, and
//! interaction enums. String representations match what is persisted and
//! what crosses the API boundary.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a prospect. Set explicitly by the caller; no
/// automatic transitions are inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProspectStatus {
    New,
    Contacted,
    Interested,
    Qualified,
    Proposal,
    ClosedWon,
    ClosedLost,
}

impl ProspectStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProspectStatus::New => "new",
            ProspectStatus::Contacted => "contacted",
            ProspectStatus::Interested => "interested",
            ProspectStatus::Qualified => "qualified",
            ProspectStatus::Proposal => "proposal",
            ProspectStatus::ClosedWon => "closed-won",
            ProspectStatus::ClosedLost => "closed-lost",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ProspectStatus::New),
            "contacted" => Some(ProspectStatus::Contacted),
            "interested" => Some(ProspectStatus::Interested),
            "qualified" => Some(ProspectStatus::Qualified),
            "proposal" => Some(ProspectStatus::Proposal),
            "closed-won" => Some(ProspectStatus::ClosedWon),
            "closed-lost" => Some(ProspectStatus::ClosedLost),
            _ => None,
        }
    }
}

/// Company-size tier, derived from monthly traffic volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanySize {
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl CompanySize {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompanySize::Startup => "startup",
            CompanySize::Small => "small",
            CompanySize::Medium => "medium",
            CompanySize::Large => "large",
            CompanySize::Enterprise => "enterprise",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "startup" => Some(CompanySize::Startup),
            "small" => Some(CompanySize::Small),
            "medium" => Some(CompanySize::Medium),
            "large" => Some(CompanySize::Large),
            "enterprise" => Some(CompanySize::Enterprise),
            _ => None,
        }
    }

    /// Score contribution of this tier, see [`crate::scoring`].
    #[must_use]
    pub fn score_bonus(self) -> i32 {
        match self {
            CompanySize::Startup => 5,
            CompanySize::Small => 10,
            CompanySize::Medium => 15,
            CompanySize::Large => 20,
            CompanySize::Enterprise => 25,
        }
    }
}

/// Derived business figures for a prospect, all per month. Produced by the
/// traffic estimator and overlaid onto the prospect record on every
/// re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessEstimates {
    pub monthly_orders: i64,
    pub monthly_shipments: i64,
    pub estimated_shipping_costs: i64,
    pub estimated_monthly_revenue: i64,
    pub average_order_value: i64,
    /// Assumed conversion rate as a percentage.
    pub conversion_rate_pct: f64,
    pub estimated_monthly_visits: i64,
    pub main_destinations: Vec<String>,
    pub company_size: CompanySize,
}

/// Kind of a logged BDR interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Email,
    Call,
    Meeting,
    Demo,
    FollowUp,
}

impl InteractionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Email => "email",
            InteractionKind::Call => "call",
            InteractionKind::Meeting => "meeting",
            InteractionKind::Demo => "demo",
            InteractionKind::FollowUp => "follow-up",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(InteractionKind::Email),
            "call" => Some(InteractionKind::Call),
            "meeting" => Some(InteractionKind::Meeting),
            "demo" => Some(InteractionKind::Demo),
            "follow-up" => Some(InteractionKind::FollowUp),
            _ => None,
        }
    }
}

/// Outcome of a logged interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionOutcome {
    Positive,
    Neutral,
    Negative,
    NoResponse,
}

impl InteractionOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionOutcome::Positive => "positive",
            InteractionOutcome::Neutral => "neutral",
            InteractionOutcome::Negative => "negative",
            InteractionOutcome::NoResponse => "no-response",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(InteractionOutcome::Positive),
            "neutral" => Some(InteractionOutcome::Neutral),
            "negative" => Some(InteractionOutcome::Negative),
            "no-response" => Some(InteractionOutcome::NoResponse),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ProspectStatus::New,
            ProspectStatus::Contacted,
            ProspectStatus::Interested,
            ProspectStatus::Qualified,
            ProspectStatus::Proposal,
            ProspectStatus::ClosedWon,
            ProspectStatus::ClosedLost,
        ] {
            assert_eq!(ProspectStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn status_rejects_unknown_value() {
        assert_eq!(ProspectStatus::parse("archived"), None);
    }

    #[test]
    fn size_ordering_follows_tier_progression() {
        assert!(CompanySize::Startup < CompanySize::Small);
        assert!(CompanySize::Small < CompanySize::Medium);
        assert!(CompanySize::Medium < CompanySize::Large);
        assert!(CompanySize::Large < CompanySize::Enterprise);
    }

    #[test]
    fn size_serde_uses_lowercase() {
        let json = serde_json::to_string(&CompanySize::Enterprise).unwrap();
        assert_eq!(json, "\"enterprise\"");
    }

    #[test]
    fn interaction_kind_serde_uses_kebab_case() {
        let json = serde_json::to_string(&InteractionKind::FollowUp).unwrap();
        assert_eq!(json, "\"follow-up\"");
        let parsed: InteractionOutcome = serde_json::from_str("\"no-response\"").unwrap();
        assert_eq!(parsed, InteractionOutcome::NoResponse);
    }
}
