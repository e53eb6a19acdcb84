//! Indicative per-kilogram rates for each waste category.

use serde::Serialize;

use crate::model::WasteCategory;

/// Currency symbol the rates are quoted in (Indian rupee).
pub const CURRENCY_SYMBOL: &str = "₹";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
/// Display name and rate for one category.
pub struct PricingEntry {
    /// Category the entry belongs to.
    pub category: WasteCategory,
    /// Human-friendly category name.
    pub display_name: &'static str,
    /// Rate per kilogram in rupees.
    pub rate_per_kg: f64,
}

// Approximate market rates; adjust per region.
const PRICING_TABLE: [PricingEntry; 5] = [
    PricingEntry {
        category: WasteCategory::Paper,
        display_name: "Paper / Newspaper",
        rate_per_kg: 12.0,
    },
    PricingEntry {
        category: WasteCategory::Plastic,
        display_name: "Plastic (Bottles & More)",
        rate_per_kg: 18.0,
    },
    PricingEntry {
        category: WasteCategory::Glass,
        display_name: "Glass (Bottles & Jars)",
        rate_per_kg: 3.0,
    },
    PricingEntry {
        category: WasteCategory::Metal,
        display_name: "Metal (Steel/Aluminum)",
        rate_per_kg: 45.0,
    },
    PricingEntry {
        category: WasteCategory::Mixed,
        display_name: "Mixed Scrap",
        rate_per_kg: 8.0,
    },
];

/// Pricing entry for `category`.
#[must_use]
pub const fn pricing(category: WasteCategory) -> &'static PricingEntry {
    match category {
        WasteCategory::Paper => &PRICING_TABLE[0],
        WasteCategory::Plastic => &PRICING_TABLE[1],
        WasteCategory::Glass => &PRICING_TABLE[2],
        WasteCategory::Metal => &PRICING_TABLE[3],
        WasteCategory::Mixed => &PRICING_TABLE[4],
    }
}

/// All pricing entries in showcase order.
#[must_use]
pub fn showcase() -> &'static [PricingEntry] {
    &PRICING_TABLE
}

/// Estimated payout for `weight_kg` of `category`, rounded to two decimals.
#[must_use]
pub fn estimate_price(category: WasteCategory, weight_kg: f64) -> f64 {
    let rate = pricing(category).rate_per_kg;
    (rate * weight_kg * 100.0).round() / 100.0
}

/// Estimated payout for a single kilogram.
#[must_use]
pub fn estimate_price_default(category: WasteCategory) -> f64 {
    estimate_price(category, 1.0)
}

/// Render an amount as `₹ 18` or `₹ 4.5`.
#[must_use]
pub fn format_rupees(amount: f64) -> String {
    let fixed = format!("{amount:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{CURRENCY_SYMBOL} {trimmed}")
}
