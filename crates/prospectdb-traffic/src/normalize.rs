//! Normalization from the raw provider payload to the stable
//! [`TrafficReport`] shape consumed by the API and the prospect repository.
//!
//! All defaulting for absent provider fields happens here, in one place.
//! Derived BDR insights are produced by a fixed rule table evaluated in
//! order; rules are independent except within a tier group, where only the
//! first matching tier fires.

use serde::{Deserialize, Serialize};

use crate::types::RawSiteData;

// ---------------------------------------------------------------------------
// Normalized shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficReport {
    pub basic: BasicInfo,
    pub ranking: RankingInfo,
    pub traffic: TrafficInfo,
    pub sources: SourcesInfo,
    pub geography: GeographyInfo,
    pub keywords: KeywordsInfo,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub url: Option<String>,
    pub site_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub scraped_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingInfo {
    pub global_rank: Option<i64>,
    pub country_code: Option<String>,
    pub country_rank: Option<i64>,
    pub category_rank: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficInfo {
    pub total_visits: Option<i64>,
    /// Raw seconds from the provider, converted to whole minutes.
    pub time_on_site_minutes: Option<i64>,
    /// Rounded to one decimal.
    pub pages_per_visit: Option<f64>,
    /// Fraction converted to a rounded percentage.
    pub bounce_rate_pct: Option<i32>,
    /// Opaque month-to-visits map, passed through from the provider.
    pub estimated_monthly_visits: Option<serde_json::Value>,
}

/// Traffic-source split as rounded percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesInfo {
    pub direct: Option<i32>,
    pub search: Option<i32>,
    pub social: Option<i32>,
    pub referrals: Option<i32>,
    pub paid_referrals: Option<i32>,
    pub mail: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographyInfo {
    pub top_countries: Vec<CountryVisits>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryVisits {
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub visits_share_pct: i32,
    /// Total visits multiplied by this country's share fraction.
    pub estimated_visits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordsInfo {
    pub top_keywords: Vec<TopKeyword>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopKeyword {
    pub name: Option<String>,
    pub estimated_value: Option<f64>,
    pub volume: Option<i64>,
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Volume,
    International,
    Engagement,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

/// A derived, human-readable observation for the BDR working this prospect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub message: String,
    pub priority: InsightPriority,
    pub actionable: String,
}

// Volume-tier thresholds (monthly visits).
const VOLUME_ENTERPRISE: f64 = 100_000.0;
const VOLUME_MID_MARKET: f64 = 10_000.0;
const VOLUME_ENTRY: f64 = 1_000.0;

/// A country counts toward international reach above this visit share.
const INTERNATIONAL_SHARE: f64 = 0.05;

const ENGAGED_BOUNCE_RATE: f64 = 0.4;
const ENGAGED_PAGES_PER_VISIT: f64 = 3.0;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Builds the stable report shape from a raw provider payload.
///
/// `home_country` is excluded when counting international reach. Missing
/// optional inputs yield null/zero outputs; this function never fails.
#[must_use]
pub fn normalize_site_data(raw: &RawSiteData, home_country: &str) -> TrafficReport {
    let engagements = raw.engagements.clone().unwrap_or_default();
    let sources = raw.traffic_sources.clone().unwrap_or_default();
    let total_visits = engagements.visits;

    let top_countries = raw
        .top_countries
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|c| {
            let share = c.visits_share.unwrap_or(0.0);
            CountryVisits {
                country_code: c.country_code.clone(),
                country_name: c.country_name.clone(),
                visits_share_pct: round_pct(share),
                estimated_visits: round_i64(total_visits.unwrap_or(0.0) * share),
            }
        })
        .collect();

    let top_keywords = raw
        .top_keywords
        .as_deref()
        .unwrap_or_default()
        .iter()
        .take(5)
        .map(|k| TopKeyword {
            name: k.name.clone(),
            estimated_value: k.estimated_value,
            volume: k.volume,
        })
        .collect();

    TrafficReport {
        basic: BasicInfo {
            url: raw.url.clone(),
            site_name: raw.name.clone(),
            title: raw.title.clone(),
            description: raw.description.clone(),
            category: raw.category.clone(),
            scraped_at: raw.scraped_at.clone(),
        },
        ranking: RankingInfo {
            global_rank: raw.global_rank.as_ref().and_then(|r| r.rank),
            country_code: raw
                .country_rank
                .as_ref()
                .and_then(|r| r.country_code.clone()),
            country_rank: raw.country_rank.as_ref().and_then(|r| r.rank),
            category_rank: raw.category_rank.as_ref().and_then(|r| r.rank),
        },
        traffic: TrafficInfo {
            total_visits: total_visits.map(round_i64),
            time_on_site_minutes: engagements.time_on_site.map(|s| round_i64(s / 60.0)),
            pages_per_visit: engagements.page_per_visit.map(round_1dp),
            bounce_rate_pct: engagements.bounce_rate.map(round_pct),
            estimated_monthly_visits: raw.estimated_monthly_visits.clone(),
        },
        sources: SourcesInfo {
            direct: sources.direct.map(round_pct),
            search: sources.search.map(round_pct),
            social: sources.social.map(round_pct),
            referrals: sources.referrals.map(round_pct),
            paid_referrals: sources.paid_referrals.map(round_pct),
            mail: sources.mail.map(round_pct),
        },
        geography: GeographyInfo { top_countries },
        keywords: KeywordsInfo { top_keywords },
        insights: generate_insights(raw, home_country),
    }
}

fn generate_insights(raw: &RawSiteData, home_country: &str) -> Vec<Insight> {
    let mut insights = Vec::new();

    let visits = raw
        .engagements
        .as_ref()
        .and_then(|e| e.visits)
        .unwrap_or(0.0);
    let visits_fmt = format_thousands(round_i64(visits));

    // Rule 1: volume tiering. Only the first matching tier fires.
    if visits > VOLUME_ENTERPRISE {
        insights.push(Insight {
            kind: InsightKind::Volume,
            message: format!(
                "High traffic volume ({visits_fmt} visits/month) - potential enterprise client"
            ),
            priority: InsightPriority::High,
            actionable: "Lead with enterprise solutions and a dedicated account manager".into(),
        });
    } else if visits > VOLUME_MID_MARKET {
        insights.push(Insight {
            kind: InsightKind::Volume,
            message: format!(
                "Medium traffic volume ({visits_fmt} visits/month) - good fit for mid-market solutions"
            ),
            priority: InsightPriority::Medium,
            actionable: "Propose scalable plans with room to grow".into(),
        });
    } else if visits > VOLUME_ENTRY {
        insights.push(Insight {
            kind: InsightKind::Volume,
            message: format!(
                "Low traffic volume ({visits_fmt} visits/month) - candidate for entry-level solutions"
            ),
            priority: InsightPriority::Low,
            actionable: "Focus on competitive pricing and ease of use".into(),
        });
    }

    // Rule 2: international reach, excluding the home country.
    let international = raw
        .top_countries
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|c| {
            c.visits_share.unwrap_or(0.0) > INTERNATIONAL_SHARE
                && c.country_code
                    .as_deref()
                    .is_none_or(|code| !code.eq_ignore_ascii_case(home_country))
        })
        .count();

    if international > 3 {
        insights.push(Insight {
            kind: InsightKind::International,
            message: format!(
                "Strong international presence ({international} countries) - prime candidate for cross-border shipping"
            ),
            priority: InsightPriority::High,
            actionable: "Emphasize competitive international rates and the global carrier network"
                .into(),
        });
    } else if international > 1 {
        insights.push(Insight {
            kind: InsightKind::International,
            message: format!(
                "Limited international presence ({international} countries) - room for expansion"
            ),
            priority: InsightPriority::Medium,
            actionable: "Pitch geographic expansion backed by multi-carrier coverage".into(),
        });
    }

    // Rule 3: engagement quality.
    let bounce_rate = raw
        .engagements
        .as_ref()
        .and_then(|e| e.bounce_rate)
        .unwrap_or(0.0);
    let pages_per_visit = raw
        .engagements
        .as_ref()
        .and_then(|e| e.page_per_visit)
        .unwrap_or(0.0);

    if bounce_rate < ENGAGED_BOUNCE_RATE && pages_per_visit > ENGAGED_PAGES_PER_VISIT {
        insights.push(Insight {
            kind: InsightKind::Engagement,
            message: "High user engagement - well-structured e-commerce site".into(),
            priority: InsightPriority::Medium,
            actionable: "Quality site; serious prospect with strong conversion potential".into(),
        });
    }

    // Rule 4: business-type confirmation.
    if raw
        .category
        .as_deref()
        .is_some_and(|c| c.to_lowercase().contains("ecommerce"))
    {
        insights.push(Insight {
            kind: InsightKind::Business,
            message: "Confirmed e-commerce business - ideal shipping prospect".into(),
            priority: InsightPriority::High,
            actionable: "Proceed with a demo and an e-commerce case study".into(),
        });
    }

    insights
}

// ---------------------------------------------------------------------------
// Rounding helpers
// ---------------------------------------------------------------------------

#[allow(clippy::cast_possible_truncation)]
fn round_i64(v: f64) -> i64 {
    v.round() as i64
}

/// Fraction in `[0, 1]` to a rounded percentage.
#[allow(clippy::cast_possible_truncation)]
fn round_pct(fraction: f64) -> i32 {
    (fraction * 100.0).round() as i32
}

fn round_1dp(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn format_thousands(n: i64) -> String {
    let raw = n.abs().to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
