//! Website-traffic enrichment: provider client, payload normalization,
//! BDR insight rules, and business estimation.

mod client;
mod domain;
mod error;
mod estimate;
mod normalize;
mod types;

pub use client::TrafficClient;
pub use domain::extract_domain;
pub use error::TrafficError;
pub use estimate::{estimate_business, estimate_company_size};
pub use prospectdb_core::prospect::BusinessEstimates;
pub use normalize::{
    normalize_site_data, BasicInfo, CountryVisits, GeographyInfo, Insight, InsightKind,
    InsightPriority, KeywordsInfo, RankingInfo, SourcesInfo, TopKeyword, TrafficInfo,
    TrafficReport,
};
pub use types::{
    CategoryRank, CountryRank, Engagements, GlobalRank, RawCountry, RawKeyword, RawSiteData,
    TrafficSources,
};
