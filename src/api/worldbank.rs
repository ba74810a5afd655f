// Client for the World Bank Indicators API (v2).
// https://datahelpdesk.worldbank.org/knowledgebase/articles/898581-api-basic-call-structures

use std::time::Duration;

use log::debug;
use reqwest::{blocking::Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{
    api::{IndicatorSource, SourceError},
    config::ProviderConfig,
    model::{Country, SeriesPoint},
    utils::retry::with_retry,
};

/// Provider message ids that mean the requested indicator does not exist
/// (invalid value, or deleted/archived series).
const NOT_FOUND_MESSAGE_IDS: [&str; 2] = ["120", "175"];

#[derive(Debug, Deserialize)]
struct Tagged {
    id: String,
    value: String,
}

/// An entry of the economy reference set.  Besides the region, the provider
/// also sends admin region, income level, lending type and coordinates; none
/// of them are kept.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Economy {
    id: String,
    name: String,
    #[serde(default)]
    capital_city: String,
    region: Tagged,
}

impl Economy {
    fn is_aggregate(&self) -> bool {
        self.region.id == "NA" || self.region.value == "Aggregates"
    }
}

impl From<Economy> for Country {
    fn from(e: Economy) -> Self {
        Country {
            code: e.id,
            name: e.name,
            capital_city: e.capital_city,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Observation {
    #[serde(rename = "countryiso3code")]
    country_code: String,
    date: String,
    value: Option<f64>,
}

impl From<Observation> for SeriesPoint {
    fn from(o: Observation) -> Self {
        SeriesPoint {
            country_code: o.country_code,
            year: parse_year(&o.date),
            value: o.value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeriesInfo {
    name: String,
}

/// Dates are "2023" for annual series, "2023Q1" or "2023M01" otherwise.
fn parse_year(date: &str) -> Option<i32> {
    date.get(0..4).and_then(|y| y.parse::<i32>().ok())
}

fn as_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().map(|n| n as u32),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// The provider reports errors with a 200 status and a body like
/// `[{"message":[{"id":"120","key":"Invalid value","value":"..."}]}]`.
fn check_message(body: &Value, indicator_code: Option<&str>) -> Result<(), SourceError> {
    let Some(message) = body
        .get(0)
        .and_then(|e| e.get("message"))
        .and_then(|m| m.get(0))
    else {
        return Ok(());
    };
    let id = message
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if let Some(code) = indicator_code {
        if NOT_FOUND_MESSAGE_IDS.contains(&id.as_str()) {
            return Err(SourceError::IndicatorNotFound {
                code: code.to_string(),
            });
        }
    }
    let text = |k: &str| message.get(k).and_then(|v| v.as_str()).unwrap_or_default();
    Err(SourceError::Api {
        code: id,
        message: format!("{}: {}", text("key"), text("value")).trim().to_string(),
    })
}

/// Parse one page of a `[meta, records]` response.  Return the total number
/// of pages and the records on this page.
fn parse_page<T: DeserializeOwned>(
    body: &str,
    indicator_code: Option<&str>,
) -> Result<(u32, Vec<T>), SourceError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;
    check_message(&value, indicator_code)?;
    let parts = value
        .as_array()
        .ok_or_else(|| SourceError::Decode("expected a JSON array".to_string()))?;
    let pages = parts
        .first()
        .and_then(|meta| meta.get("pages"))
        .and_then(as_u32)
        .unwrap_or(1);
    let records = match parts.get(1) {
        None | Some(Value::Null) => vec![],
        Some(records) => serde_json::from_value(records.clone())
            .map_err(|e| SourceError::Decode(e.to_string()))?,
    };
    Ok((pages, records))
}

/// Build an endpoint URL.  Each segment is escaped, so a code like `A/B?x`
/// stays one path segment.
fn endpoint(base_url: &str, segments: &[&str], query: &str) -> Result<String, SourceError> {
    let mut url =
        Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(format!("{base_url}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| SourceError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(segments);
    url.set_query(Some(query));
    Ok(url.to_string())
}

/// `;` separates several indicators in a path segment and is not escaped
/// there.  Such a code, or an empty one, can't name a single indicator.
fn check_code(indicator_code: &str) -> Result<(), SourceError> {
    if indicator_code.is_empty() || indicator_code.contains(';') {
        return Err(SourceError::IndicatorNotFound {
            code: indicator_code.to_string(),
        });
    }
    Ok(())
}

/// Request `url` one page at a time through `fetch` until the page count
/// reported by the provider is reached.
fn walk_pages<T, F>(
    url: &str,
    indicator_code: Option<&str>,
    mut fetch: F,
) -> Result<Vec<T>, SourceError>
where
    T: DeserializeOwned,
    F: FnMut(&str) -> Result<String, SourceError>,
{
    let mut out: Vec<T> = Vec::new();
    let mut page = 1;
    loop {
        let page_url = format!("{}&page={}", url, page);
        debug!("GET {}", page_url);
        let body = fetch(&page_url)?;
        let (pages, mut records) = parse_page::<T>(&body, indicator_code)?;
        out.append(&mut records);
        if page >= pages {
            break;
        }
        page += 1;
    }
    Ok(out)
}

pub struct WorldBankClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
    initial_wait: Duration,
}

impl WorldBankClient {
    pub fn new(config: &ProviderConfig) -> Result<WorldBankClient, SourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("databank/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(WorldBankClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts,
            initial_wait: Duration::from_millis(500),
        })
    }

    fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text()?)
    }

    /// Walk all the pages of a paged endpoint.  Transient failures of a
    /// page request are retried.
    fn get_all<T: DeserializeOwned>(
        &self,
        url: &str,
        indicator_code: Option<&str>,
    ) -> Result<Vec<T>, SourceError> {
        walk_pages(url, indicator_code, |page_url| {
            with_retry(
                self.max_attempts,
                self.initial_wait,
                SourceError::is_transient,
                || self.get_text(page_url),
            )
        })
    }
}

impl IndicatorSource for WorldBankClient {
    fn list_countries(&self) -> Result<Vec<Country>, SourceError> {
        let url = endpoint(&self.base_url, &["country"], "format=json&per_page=1000")?;
        let economies: Vec<Economy> = self.get_all(&url, None)?;
        Ok(economies
            .into_iter()
            .filter(|e| !e.is_aggregate())
            .map(Country::from)
            .collect())
    }

    fn fetch_series(
        &self,
        indicator_code: &str,
        country_codes: &[String],
    ) -> Result<Vec<SeriesPoint>, SourceError> {
        check_code(indicator_code)?;
        if country_codes.is_empty() {
            return Ok(vec![]);
        }
        let countries = country_codes.join(";");
        let url = endpoint(
            &self.base_url,
            &["country", &countries, "indicator", indicator_code],
            "format=json&mrnev=1&per_page=20000",
        )?;
        let observations: Vec<Observation> = self.get_all(&url, Some(indicator_code))?;
        Ok(observations.into_iter().map(SeriesPoint::from).collect())
    }

    fn fetch_series_name(&self, indicator_code: &str) -> Result<String, SourceError> {
        check_code(indicator_code)?;
        let url = endpoint(
            &self.base_url,
            &["indicator", indicator_code],
            "format=json&per_page=50",
        )?;
        let infos: Vec<SeriesInfo> = self.get_all(&url, Some(indicator_code))?;
        infos
            .into_iter()
            .next()
            .map(|info| info.name)
            .ok_or_else(|| SourceError::IndicatorNotFound {
                code: indicator_code.to_string(),
            })
    }
}
