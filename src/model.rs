use serde::{Deserialize, Serialize};

/// A country from the provider's economy reference set.  Aggregates
/// (regions, income groups) never make it into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub capital_city: String,
}

/// One observation of a series for one country, as returned by the provider
/// after the provider-specific field names have been mapped.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub country_code: String,
    pub year: Option<i32>,
    pub value: Option<f64>,
}

/// A series point tagged with the indicator it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RawIndicatorRow {
    pub country_code: String,
    pub value: Option<f64>,
    pub year: Option<i32>,
    pub indicator_code: String,
    pub indicator_name: String,
}

/// A row of the `databank` table, in column order.
///
/// Rows for countries without any indicator data have the indicator fields
/// set to `None`.  Rows for country codes unknown to the reference set have
/// the country fields set to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRow {
    pub country_code: String,
    pub country_name: Option<String>,
    pub capital_city: Option<String>,
    pub indicator_code: Option<String>,
    pub indicator_name: Option<String>,
    pub year: Option<i32>,
    pub value: Option<f64>,
}
