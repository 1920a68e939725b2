//! Business estimates derived from monthly traffic volume.
//!
//! Pure arithmetic over fixed conversion assumptions; no I/O. Estimates are
//! overwritable on every re-analysis, so determinism here gives the
//! pipeline its idempotence.

use prospectdb_core::prospect::{BusinessEstimates, CompanySize};

use crate::normalize::TrafficReport;

/// Share of visits assumed to convert to an order.
pub const CONVERSION_RATE: f64 = 0.02;
/// Average order value, EUR.
pub const AVERAGE_ORDER_VALUE_EUR: i64 = 75;
/// Multi-item orders produce ~5% more parcels than orders.
pub const SHIPMENT_UPLIFT: f64 = 1.05;
/// Average shipping cost per parcel, EUR.
pub const SHIPPING_COST_EUR: f64 = 3.50;

const SIZE_ENTERPRISE_VISITS: i64 = 500_000;
const SIZE_LARGE_VISITS: i64 = 100_000;
const SIZE_MEDIUM_VISITS: i64 = 10_000;
const SIZE_SMALL_VISITS: i64 = 1_000;

/// Company-size tier for a monthly visit volume. Monotonic non-decreasing.
#[must_use]
pub fn estimate_company_size(monthly_visits: i64) -> CompanySize {
    if monthly_visits > SIZE_ENTERPRISE_VISITS {
        CompanySize::Enterprise
    } else if monthly_visits > SIZE_LARGE_VISITS {
        CompanySize::Large
    } else if monthly_visits > SIZE_MEDIUM_VISITS {
        CompanySize::Medium
    } else if monthly_visits > SIZE_SMALL_VISITS {
        CompanySize::Small
    } else {
        CompanySize::Startup
    }
}

/// Derives order/shipment/revenue estimates from a normalized report.
///
/// Main destinations are the top three countries by the provider's own
/// ordering of the geography block.
#[must_use]
pub fn estimate_business(report: &TrafficReport) -> BusinessEstimates {
    let visits = report.traffic.total_visits.unwrap_or(0).max(0);

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let monthly_orders = (visits as f64 * CONVERSION_RATE).round() as i64;
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let monthly_shipments = (monthly_orders as f64 * SHIPMENT_UPLIFT).round() as i64;
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let estimated_shipping_costs = (monthly_shipments as f64 * SHIPPING_COST_EUR).round() as i64;

    let main_destinations = report
        .geography
        .top_countries
        .iter()
        .take(3)
        .filter_map(|c| c.country_name.clone().or_else(|| c.country_code.clone()))
        .collect();

    BusinessEstimates {
        monthly_orders,
        monthly_shipments,
        estimated_shipping_costs,
        estimated_monthly_revenue: monthly_orders * AVERAGE_ORDER_VALUE_EUR,
        average_order_value: AVERAGE_ORDER_VALUE_EUR,
        conversion_rate_pct: CONVERSION_RATE * 100.0,
        estimated_monthly_visits: visits,
        main_destinations,
        company_size: estimate_company_size(visits),
    }
}
