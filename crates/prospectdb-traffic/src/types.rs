//! Raw provider payload shapes.
//!
//! The provider returns deeply nested JSON with no schema guarantees; every
//! field here is optional and unknown fields are ignored, so a sparse or
//! partially-populated payload deserializes cleanly and the normalizer does
//! the defaulting in one place.

use serde::{Deserialize, Serialize};

/// One dataset item from the provider's run-sync endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSiteData {
    pub url: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub scraped_at: Option<String>,
    pub global_rank: Option<GlobalRank>,
    pub country_rank: Option<CountryRank>,
    pub category_rank: Option<CategoryRank>,
    pub engagements: Option<Engagements>,
    pub traffic_sources: Option<TrafficSources>,
    pub top_countries: Option<Vec<RawCountry>>,
    pub top_keywords: Option<Vec<RawKeyword>>,
    /// Opaque month-to-visits map; carried through unchanged.
    pub estimated_monthly_visits: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalRank {
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountryRank {
    pub country_code: Option<String>,
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryRank {
    pub category: Option<String>,
    pub rank: Option<i64>,
}

/// Engagement block: visit counts and on-site behavior.
///
/// `time_on_site` is in seconds and `bounce_rate` is a fraction in `[0, 1]`;
/// conversion to minutes/percentages happens in the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Engagements {
    pub visits: Option<f64>,
    pub time_on_site: Option<f64>,
    pub page_per_visit: Option<f64>,
    pub bounce_rate: Option<f64>,
}

/// Traffic-source split, each a fraction in `[0, 1]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrafficSources {
    pub direct: Option<f64>,
    pub search: Option<f64>,
    pub social: Option<f64>,
    pub referrals: Option<f64>,
    pub paid_referrals: Option<f64>,
    pub mail: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCountry {
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    /// Fraction of total visits in `[0, 1]`.
    pub visits_share: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawKeyword {
    pub name: Option<String>,
    pub estimated_value: Option<f64>,
    pub volume: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_deserializes_to_all_none() {
        let data: RawSiteData = serde_json::from_str("{}").expect("empty payload");
        assert!(data.url.is_none());
        assert!(data.engagements.is_none());
        assert!(data.top_countries.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let data: RawSiteData = serde_json::from_str(
            r#"{"url": "https://x.com", "someNewProviderField": {"a": 1}}"#,
        )
        .expect("payload with extras");
        assert_eq!(data.url.as_deref(), Some("https://x.com"));
    }

    #[test]
    fn nested_blocks_tolerate_partial_population() {
        let data: RawSiteData = serde_json::from_str(
            r#"{"engagements": {"visits": 1200.0}, "globalRank": {}}"#,
        )
        .expect("partial payload");
        let eng = data.engagements.expect("engagements");
        assert_eq!(eng.visits, Some(1200.0));
        assert!(eng.bounce_rate.is_none());
        assert!(data.global_rank.expect("globalRank").rank.is_none());
    }
}
