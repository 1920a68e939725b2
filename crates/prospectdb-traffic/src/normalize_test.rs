use super::*;
use crate::types::{Engagements, RawCountry, RawKeyword, RawSiteData, TrafficSources};

fn country(code: &str, name: &str, share: f64) -> RawCountry {
    RawCountry {
        country_code: Some(code.to_owned()),
        country_name: Some(name.to_owned()),
        visits_share: Some(share),
    }
}

/// A fully-populated payload for the headline scenario: 150k visits, low
/// bounce, four >5% non-home countries, e-commerce category.
fn rich_payload() -> RawSiteData {
    RawSiteData {
        url: Some("https://www.fastship.example".to_owned()),
        name: Some("Fastship".to_owned()),
        title: Some("Fastship - shop".to_owned()),
        description: Some("Online store".to_owned()),
        category: Some("Ecommerce".to_owned()),
        scraped_at: Some("2025-06-01T00:00:00Z".to_owned()),
        engagements: Some(Engagements {
            visits: Some(150_000.0),
            time_on_site: Some(185.0),
            page_per_visit: Some(4.24),
            bounce_rate: Some(0.3),
        }),
        traffic_sources: Some(TrafficSources {
            direct: Some(0.351),
            search: Some(0.42),
            social: Some(0.1),
            referrals: Some(0.05),
            paid_referrals: Some(0.029),
            mail: Some(0.05),
        }),
        top_countries: Some(vec![
            country("IT", "Italy", 0.40),
            country("DE", "Germany", 0.20),
            country("FR", "France", 0.15),
            country("ES", "Spain", 0.10),
            country("NL", "Netherlands", 0.08),
        ]),
        top_keywords: Some(vec![
            RawKeyword {
                name: Some("fast shipping".to_owned()),
                estimated_value: Some(1200.5),
                volume: Some(9_000),
            };
            7
        ]),
        ..RawSiteData::default()
    }
}

#[test]
fn empty_payload_normalizes_without_panicking() {
    let report = normalize_site_data(&RawSiteData::default(), "IT");

    assert!(report.basic.url.is_none());
    assert!(report.traffic.total_visits.is_none());
    assert!(report.traffic.bounce_rate_pct.is_none());
    assert!(report.sources.direct.is_none());
    assert!(report.geography.top_countries.is_empty());
    assert!(report.keywords.top_keywords.is_empty());
    assert!(report.insights.is_empty());
}

#[test]
fn traffic_block_converts_units() {
    let report = normalize_site_data(&rich_payload(), "IT");

    assert_eq!(report.traffic.total_visits, Some(150_000));
    // 185 seconds -> 3 minutes
    assert_eq!(report.traffic.time_on_site_minutes, Some(3));
    // 4.24 -> one decimal
    assert_eq!(report.traffic.pages_per_visit, Some(4.2));
    // 0.3 fraction -> 30%
    assert_eq!(report.traffic.bounce_rate_pct, Some(30));
}

#[test]
fn source_percentages_stay_within_bounds() {
    let report = normalize_site_data(&rich_payload(), "IT");
    let s = &report.sources;
    for pct in [s.direct, s.search, s.social, s.referrals, s.paid_referrals, s.mail] {
        let pct = pct.expect("sources all present");
        assert!((0..=100).contains(&pct), "percentage out of range: {pct}");
    }
    assert_eq!(s.direct, Some(35));
    assert_eq!(s.paid_referrals, Some(3));
}

#[test]
fn geography_derives_share_and_absolute_visits() {
    let report = normalize_site_data(&rich_payload(), "IT");
    let top = &report.geography.top_countries;

    assert_eq!(top.len(), 5);
    assert_eq!(top[0].country_code.as_deref(), Some("IT"));
    assert_eq!(top[0].visits_share_pct, 40);
    assert_eq!(top[0].estimated_visits, 60_000);
    assert_eq!(top[4].visits_share_pct, 8);
    assert_eq!(top[4].estimated_visits, 12_000);
}

#[test]
fn country_percentages_stay_within_bounds_for_unit_share() {
    let raw = RawSiteData {
        engagements: Some(Engagements {
            visits: Some(1_000.0),
            ..Engagements::default()
        }),
        top_countries: Some(vec![country("US", "United States", 1.0)]),
        ..RawSiteData::default()
    };
    let report = normalize_site_data(&raw, "IT");
    assert_eq!(report.geography.top_countries[0].visits_share_pct, 100);
    assert_eq!(report.geography.top_countries[0].estimated_visits, 1_000);
}

#[test]
fn keywords_are_capped_at_five_in_provider_order() {
    let report = normalize_site_data(&rich_payload(), "IT");
    assert_eq!(report.keywords.top_keywords.len(), 5);
    assert_eq!(
        report.keywords.top_keywords[0].name.as_deref(),
        Some("fast shipping")
    );
}

#[test]
fn headline_scenario_produces_all_four_insights() {
    // visits=150,000, bounce=0.3, pages=4.24, category=Ecommerce, four
    // countries with >5% share besides the home country.
    let report = normalize_site_data(&rich_payload(), "IT");
    let insights = &report.insights;
    assert_eq!(insights.len(), 4, "expected 4 insights, got: {insights:?}");

    let find = |kind: InsightKind| {
        insights
            .iter()
            .find(|i| i.kind == kind)
            .unwrap_or_else(|| panic!("missing {kind:?} insight"))
    };

    assert_eq!(find(InsightKind::Volume).priority, InsightPriority::High);
    assert_eq!(
        find(InsightKind::International).priority,
        InsightPriority::High
    );
    assert_eq!(
        find(InsightKind::Engagement).priority,
        InsightPriority::Medium
    );
    assert_eq!(find(InsightKind::Business).priority, InsightPriority::High);
}

#[test]
fn volume_insight_includes_formatted_count() {
    let report = normalize_site_data(&rich_payload(), "IT");
    let volume = report
        .insights
        .iter()
        .find(|i| i.kind == InsightKind::Volume)
        .expect("volume insight");
    assert!(
        volume.message.contains("150,000"),
        "message should carry the formatted visit count: {}",
        volume.message
    );
}

#[test]
fn tiny_site_emits_no_volume_insight() {
    let raw = RawSiteData {
        engagements: Some(Engagements {
            visits: Some(500.0),
            ..Engagements::default()
        }),
        ..RawSiteData::default()
    };
    let report = normalize_site_data(&raw, "IT");
    assert!(
        !report.insights.iter().any(|i| i.kind == InsightKind::Volume),
        "500 visits must not trigger a volume insight"
    );
}

#[test]
fn volume_tiers_fire_exclusively() {
    for (visits, priority) in [
        (1_500.0, InsightPriority::Low),
        (50_000.0, InsightPriority::Medium),
        (200_000.0, InsightPriority::High),
    ] {
        let raw = RawSiteData {
            engagements: Some(Engagements {
                visits: Some(visits),
                ..Engagements::default()
            }),
            ..RawSiteData::default()
        };
        let report = normalize_site_data(&raw, "IT");
        let volume: Vec<_> = report
            .insights
            .iter()
            .filter(|i| i.kind == InsightKind::Volume)
            .collect();
        assert_eq!(volume.len(), 1, "exactly one tier fires for {visits}");
        assert_eq!(volume[0].priority, priority);
    }
}

#[test]
fn home_country_is_excluded_from_international_count() {
    // Two non-home countries above the 5% bar -> medium priority.
    let raw = RawSiteData {
        top_countries: Some(vec![
            country("IT", "Italy", 0.70),
            country("DE", "Germany", 0.15),
            country("FR", "France", 0.10),
            country("US", "United States", 0.03),
        ]),
        ..RawSiteData::default()
    };
    let report = normalize_site_data(&raw, "IT");
    let intl = report
        .insights
        .iter()
        .find(|i| i.kind == InsightKind::International)
        .expect("international insight");
    assert_eq!(intl.priority, InsightPriority::Medium);
    assert!(intl.message.contains("(2 countries)"));
}

#[test]
fn single_foreign_country_is_not_international() {
    let raw = RawSiteData {
        top_countries: Some(vec![
            country("IT", "Italy", 0.90),
            country("DE", "Germany", 0.10),
        ]),
        ..RawSiteData::default()
    };
    let report = normalize_site_data(&raw, "IT");
    assert!(!report
        .insights
        .iter()
        .any(|i| i.kind == InsightKind::International));
}

#[test]
fn engagement_insight_requires_both_conditions() {
    // Low bounce but shallow visits: no engagement insight.
    let raw = RawSiteData {
        engagements: Some(Engagements {
            bounce_rate: Some(0.2),
            page_per_visit: Some(2.0),
            ..Engagements::default()
        }),
        ..RawSiteData::default()
    };
    let report = normalize_site_data(&raw, "IT");
    assert!(!report
        .insights
        .iter()
        .any(|i| i.kind == InsightKind::Engagement));
}

#[test]
fn business_insight_matches_category_case_insensitively() {
    let raw = RawSiteData {
        category: Some("eCommerce_and_Shopping/Marketplace".to_owned()),
        ..RawSiteData::default()
    };
    let report = normalize_site_data(&raw, "IT");
    assert!(report
        .insights
        .iter()
        .any(|i| i.kind == InsightKind::Business));
}

#[test]
fn normalization_is_deterministic() {
    let raw = rich_payload();
    let a = serde_json::to_value(normalize_site_data(&raw, "IT")).unwrap();
    let b = serde_json::to_value(normalize_site_data(&raw, "IT")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn report_serializes_with_camel_case_keys() {
    let report = normalize_site_data(&rich_payload(), "IT");
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["traffic"]["totalVisits"].is_i64());
    assert!(json["geography"]["topCountries"].is_array());
    assert_eq!(json["insights"][0]["type"], "volume");
}
