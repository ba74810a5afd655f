use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::model::{Country, FinalRow, RawIndicatorRow, SeriesPoint};

#[derive(Error, Debug, PartialEq)]
pub enum MergeError {
    #[error("no indicator was fetched successfully, nothing to load")]
    NoIndicatorData,
}

/// Tag the points of one series with the indicator they belong to.
pub fn normalize(
    points: Vec<SeriesPoint>,
    indicator_code: &str,
    indicator_name: &str,
) -> Vec<RawIndicatorRow> {
    points
        .into_iter()
        .map(|p| RawIndicatorRow {
            country_code: p.country_code,
            value: p.value,
            year: p.year,
            indicator_code: indicator_code.to_string(),
            indicator_name: indicator_name.to_string(),
        })
        .collect()
}

/// Concatenate the row sets of all the fetched indicators.  Rows are not
/// deduplicated.  Fails if there is no row set at all, an indicator that
/// was fetched but returned no rows still counts as a row set.
pub fn concat(batches: Vec<Vec<RawIndicatorRow>>) -> Result<Vec<RawIndicatorRow>, MergeError> {
    if batches.is_empty() {
        return Err(MergeError::NoIndicatorData);
    }
    Ok(batches.into_iter().flatten().collect())
}

/// Full outer join of the indicator rows with the countries on the country
/// code.  The output is sorted by country code, rows of the same country
/// keep their input order.
///
/// A country without any indicator row shows up once, with empty indicator
/// fields.  A row whose country code is not in the reference set shows up
/// with empty country fields.
pub fn outer_join(countries: &[Country], rows: Vec<RawIndicatorRow>) -> Vec<FinalRow> {
    let mut by_code: HashMap<&str, &Country> = HashMap::new();
    for country in countries {
        by_code.entry(country.code.as_str()).or_insert(country);
    }

    let mut groups: BTreeMap<String, Vec<RawIndicatorRow>> = BTreeMap::new();
    for country in countries {
        groups.entry(country.code.clone()).or_default();
    }
    for row in rows {
        groups.entry(row.country_code.clone()).or_default().push(row);
    }

    let mut out: Vec<FinalRow> = Vec::new();
    for (code, group) in groups {
        let country = by_code.get(code.as_str());
        let country_name = country.map(|c| c.name.clone());
        let capital_city = country.map(|c| c.capital_city.clone());
        if group.is_empty() {
            out.push(FinalRow {
                country_code: code,
                country_name,
                capital_city,
                indicator_code: None,
                indicator_name: None,
                year: None,
                value: None,
            });
            continue;
        }
        for row in group {
            out.push(FinalRow {
                country_code: row.country_code,
                country_name: country_name.clone(),
                capital_city: capital_city.clone(),
                indicator_code: Some(row.indicator_code),
                indicator_name: Some(row.indicator_name),
                year: row.year,
                value: row.value,
            });
        }
    }
    out
}

/// Concatenate the indicator row sets and join them with the countries.
pub fn merge(
    countries: &[Country],
    batches: Vec<Vec<RawIndicatorRow>>,
) -> Result<Vec<FinalRow>, MergeError> {
    let rows = concat(batches)?;
    Ok(outer_join(countries, rows))
}
