//! An in-memory provider for the tests.

use std::{
    cell::Cell,
    collections::{HashMap, HashSet},
};

use crate::{
    api::{IndicatorSource, SourceError},
    model::{Country, SeriesPoint},
};

pub fn country(code: &str) -> Country {
    Country {
        code: code.to_string(),
        name: format!("{} name", code),
        capital_city: format!("{} capital", code),
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub countries: Vec<Country>,
    series: HashMap<String, (String, Vec<SeriesPoint>)>,
    missing_names: HashSet<String>,
    fail_countries: bool,
    series_calls: Cell<usize>,
    name_calls: Cell<usize>,
}

impl FakeSource {
    pub fn new(countries: Vec<Country>) -> FakeSource {
        FakeSource {
            countries,
            ..Default::default()
        }
    }

    pub fn with_series(
        mut self,
        code: &str,
        name: &str,
        points: &[(&str, i32, f64)],
    ) -> FakeSource {
        let points = points
            .iter()
            .map(|(country_code, year, value)| SeriesPoint {
                country_code: country_code.to_string(),
                year: Some(*year),
                value: Some(*value),
            })
            .collect();
        self.series
            .insert(code.to_string(), (name.to_string(), points));
        self
    }

    pub fn without_name(mut self, code: &str) -> FakeSource {
        self.missing_names.insert(code.to_string());
        self
    }

    pub fn failing_countries(mut self) -> FakeSource {
        self.fail_countries = true;
        self
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.get()
    }

    pub fn name_calls(&self) -> usize {
        self.name_calls.get()
    }
}

impl IndicatorSource for FakeSource {
    fn list_countries(&self) -> Result<Vec<Country>, SourceError> {
        if self.fail_countries {
            return Err(SourceError::HttpStatus {
                status: 503,
                url: "fake://country".to_string(),
            });
        }
        Ok(self.countries.clone())
    }

    fn fetch_series(
        &self,
        indicator_code: &str,
        country_codes: &[String],
    ) -> Result<Vec<SeriesPoint>, SourceError> {
        self.series_calls.set(self.series_calls.get() + 1);
        match self.series.get(indicator_code) {
            Some((_, points)) => Ok(points
                .iter()
                .filter(|p| country_codes.contains(&p.country_code))
                .cloned()
                .collect()),
            None => Err(SourceError::IndicatorNotFound {
                code: indicator_code.to_string(),
            }),
        }
    }

    fn fetch_series_name(&self, indicator_code: &str) -> Result<String, SourceError> {
        self.name_calls.set(self.name_calls.get() + 1);
        match self.series.get(indicator_code) {
            Some((name, _)) if !self.missing_names.contains(indicator_code) => Ok(name.clone()),
            _ => Err(SourceError::IndicatorNotFound {
                code: indicator_code.to_string(),
            }),
        }
    }
}
