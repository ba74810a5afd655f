use log::{info, warn};
use tabled::{builder::Builder, settings::Style};

use crate::{
    api::{IndicatorSource, SourceError},
    etl::merge::normalize,
    model::{Country, RawIndicatorRow},
};

/// What happened to one requested indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorStatus {
    Fetched { rows: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorOutcome {
    pub code: String,
    pub status: IndicatorStatus,
}

#[derive(Debug, Default)]
pub struct FetchResult {
    /// One row set per fetched indicator, in request order.
    pub batches: Vec<Vec<RawIndicatorRow>>,
    /// One entry per requested indicator, in request order.
    pub outcomes: Vec<IndicatorOutcome>,
}

impl FetchResult {
    /// Counted from the outcomes, the batches may already have been moved out.
    pub fn fetched_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, IndicatorStatus::Fetched { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, IndicatorStatus::Skipped { .. }))
            .count()
    }

    /// Make an ASCII table with the status of each indicator.
    pub fn summary_table(&self) -> tabled::Table {
        let mut builder = Builder::new();
        builder.push_record(vec!["Indicator", "Status", "Rows", "Reason"]);
        for outcome in &self.outcomes {
            match &outcome.status {
                IndicatorStatus::Fetched { rows } => builder.push_record(vec![
                    outcome.code.clone(),
                    "fetched".to_string(),
                    rows.to_string(),
                    String::new(),
                ]),
                IndicatorStatus::Skipped { reason } => builder.push_record(vec![
                    outcome.code.clone(),
                    "skipped".to_string(),
                    "0".to_string(),
                    reason.clone(),
                ]),
            }
        }
        let mut table = builder.build();
        table.with(Style::sharp());
        table
    }
}

fn fetch_one(
    source: &dyn IndicatorSource,
    code: &str,
    country_codes: &[String],
) -> Result<Vec<RawIndicatorRow>, SourceError> {
    let points = source.fetch_series(code, country_codes)?;
    let name = source.fetch_series_name(code)?;
    Ok(normalize(points, code, &name))
}

/// Fetch every indicator for all the countries, one request batch per
/// indicator.  An indicator that fails is skipped and does not stop the
/// others.
pub fn fetch_indicators(
    source: &dyn IndicatorSource,
    codes: &[String],
    countries: &[Country],
) -> FetchResult {
    let country_codes: Vec<String> = countries.iter().map(|c| c.code.clone()).collect();
    let n = codes.len();
    let mut result = FetchResult::default();

    for (i, code) in codes.iter().enumerate() {
        let status = if code.trim().is_empty() {
            warn!("[{}/{}] skipping empty indicator code", i + 1, n);
            IndicatorStatus::Skipped {
                reason: "empty indicator code".to_string(),
            }
        } else {
            match fetch_one(source, code, &country_codes) {
                Ok(rows) => {
                    info!("[{}/{}] {}: {} rows", i + 1, n, code, rows.len());
                    let status = IndicatorStatus::Fetched { rows: rows.len() };
                    result.batches.push(rows);
                    status
                }
                Err(e) => {
                    warn!("[{}/{}] {}: skipped, {}", i + 1, n, code, e);
                    IndicatorStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
            }
        };
        result.outcomes.push(IndicatorOutcome {
            code: code.clone(),
            status,
        });
    }

    info!(
        "Fetched {} indicators, skipped {}",
        result.fetched_count(),
        result.skipped_count()
    );
    result
}
