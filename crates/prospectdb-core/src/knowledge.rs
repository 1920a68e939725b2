//! Knowledge-base category taxonomy and the structured carrier-rate sheet
//! carried by `carrier-rates` items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category of a reusable piece of sales content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KnowledgeCategory {
    Features,
    Benefits,
    PainPoints,
    CarrierRates,
    CaseStudies,
    Competitor,
    Objections,
    Integrations,
    Pricing,
}

impl KnowledgeCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KnowledgeCategory::Features => "features",
            KnowledgeCategory::Benefits => "benefits",
            KnowledgeCategory::PainPoints => "pain-points",
            KnowledgeCategory::CarrierRates => "carrier-rates",
            KnowledgeCategory::CaseStudies => "case-studies",
            KnowledgeCategory::Competitor => "competitor",
            KnowledgeCategory::Objections => "objections",
            KnowledgeCategory::Integrations => "integrations",
            KnowledgeCategory::Pricing => "pricing",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "features" => Some(KnowledgeCategory::Features),
            "benefits" => Some(KnowledgeCategory::Benefits),
            "pain-points" => Some(KnowledgeCategory::PainPoints),
            "carrier-rates" => Some(KnowledgeCategory::CarrierRates),
            "case-studies" => Some(KnowledgeCategory::CaseStudies),
            "competitor" => Some(KnowledgeCategory::Competitor),
            "objections" => Some(KnowledgeCategory::Objections),
            "integrations" => Some(KnowledgeCategory::Integrations),
            "pricing" => Some(KnowledgeCategory::Pricing),
            _ => None,
        }
    }
}

/// Structured rate sheet for a single carrier: services, each priced per
/// zone in weight bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierRateSheet {
    pub carrier: String,
    pub services: Vec<CarrierService>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierService {
    pub name: String,
    pub zones: Vec<ZoneRates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRates {
    pub zone: String,
    pub bands: Vec<PriceBand>,
}

/// One weight band: everything up to `max_weight_kg` ships at `price_eur`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBand {
    pub max_weight_kg: Decimal,
    pub price_eur: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip_through_strings() {
        for cat in [
            KnowledgeCategory::Features,
            KnowledgeCategory::Benefits,
            KnowledgeCategory::PainPoints,
            KnowledgeCategory::CarrierRates,
            KnowledgeCategory::CaseStudies,
            KnowledgeCategory::Competitor,
            KnowledgeCategory::Objections,
            KnowledgeCategory::Integrations,
            KnowledgeCategory::Pricing,
        ] {
            assert_eq!(KnowledgeCategory::parse(cat.as_str()), Some(cat));
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert_eq!(KnowledgeCategory::parse("swag"), None);
    }

    #[test]
    fn carrier_rate_sheet_round_trips_through_json() {
        let json = serde_json::json!({
            "carrier": "DHL",
            "services": [{
                "name": "Express",
                "zones": [{
                    "zone": "EU",
                    "bands": [
                        { "maxWeightKg": "1", "priceEur": "17.71" },
                        { "maxWeightKg": "2", "priceEur": "19.30" }
                    ]
                }]
            }]
        });
        let sheet: CarrierRateSheet = serde_json::from_value(json).expect("valid sheet");
        assert_eq!(sheet.carrier, "DHL");
        assert_eq!(sheet.services[0].zones[0].bands.len(), 2);
        let back = serde_json::to_value(&sheet).expect("serialize");
        let again: CarrierRateSheet = serde_json::from_value(back).expect("round trip");
        assert_eq!(again, sheet);
    }

    #[test]
    fn carrier_rate_sheet_rejects_malformed_bands() {
        let json = serde_json::json!({
            "carrier": "DHL",
            "services": [{ "name": "Express", "zones": [{ "zone": "EU", "bands": [{}] }] }]
        });
        assert!(serde_json::from_value::<CarrierRateSheet>(json).is_err());
    }
}
