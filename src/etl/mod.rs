pub mod fetch;
pub mod indicators;
pub mod load;
pub mod merge;

#[cfg(test)]
pub(crate) mod testing;

use std::{io, path::Path};

use log::info;
use thiserror::Error;

use crate::{
    api::{worldbank::WorldBankClient, IndicatorSource, SourceError},
    config::Config,
    db::prod_db::ProdDb,
    etl::{
        fetch::{fetch_indicators, FetchResult},
        indicators::read_indicators,
        load::{load, LoadError},
        merge::{merge, MergeError},
    },
    model::FinalRow,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot read the indicator list {path}: {source}")]
    Indicators { path: String, source: io::Error },

    #[error("the indicator list is empty")]
    NoIndicators,

    #[error("cannot create the provider client: {0}")]
    Client(SourceError),

    #[error("cannot fetch the country reference set: {0}")]
    Countries(SourceError),

    #[error("the provider returned no countries")]
    NoCountries,

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("load failed: {0}")]
    Load(#[from] LoadError),
}

#[derive(Debug)]
pub struct RunReport {
    pub fetch: FetchResult,
    pub final_rows: usize,
    pub loaded: usize,
}

/// Fetch the countries and the indicators, and join them into the rows of
/// the destination table.  Fails if the countries can't be fetched, if the
/// country list is empty, or if not a single indicator could be.
pub fn extract_transform(
    source: &dyn IndicatorSource,
    codes: &[String],
) -> Result<(FetchResult, Vec<FinalRow>), PipelineError> {
    let countries = source.list_countries().map_err(PipelineError::Countries)?;
    if countries.is_empty() {
        return Err(PipelineError::NoCountries);
    }
    info!("Got {} countries", countries.len());

    let mut fetched = fetch_indicators(source, codes, &countries);
    let batches = std::mem::take(&mut fetched.batches);
    let rows = merge(&countries, batches)?;
    info!("Merged into {} rows", rows.len());
    Ok((fetched, rows))
}

/// Run the whole job: read the indicator list, fetch, merge, and replace
/// the content of the configured destination.
pub fn update_databank(
    config: &Config,
    indicators_path: &Path,
) -> Result<RunReport, PipelineError> {
    let codes = read_indicators(indicators_path).map_err(|e| PipelineError::Indicators {
        path: indicators_path.display().to_string(),
        source: e,
    })?;
    if codes.is_empty() {
        return Err(PipelineError::NoIndicators);
    }
    info!("Gathering data for {} indicators ...", codes.len());

    let client = WorldBankClient::new(&config.provider).map_err(PipelineError::Client)?;
    let (fetch, rows) = extract_transform(&client, &codes)?;
    println!("{}", fetch.summary_table());

    let mut dest = ProdDb::destination(&config.backend)?;
    let loaded = load(dest.as_mut(), &rows)?;
    Ok(RunReport {
        fetch,
        final_rows: rows.len(),
        loaded,
    })
}
