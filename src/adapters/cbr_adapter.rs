//! Central Bank of Russia daily-JSON archive adapter implementing [`RateSource`].
//!
//! One blocking GET per day against
//! `{base_url}/archive/YYYY/MM/DD/daily_json.js`. Quotes are published per
//! `Nominal` units of the currency and normalised to one unit here.

use crate::domain::error::FxError;
use crate::ports::rate_port::RateSource;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.cbr-xml-daily.ru";
pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Valute")]
    valute: HashMap<String, Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(rename = "Nominal")]
    nominal: f64,
    #[serde(rename = "Value")]
    value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CbrSettings {
    pub base_url: String,
    pub currency: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CbrSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub struct CbrAdapter {
    client: reqwest::blocking::Client,
    settings: CbrSettings,
}

impl CbrAdapter {
    pub fn new(settings: CbrSettings) -> Result<Self, FxError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| FxError::Io(std::io::Error::other(e)))?;
        Ok(Self { client, settings })
    }

    pub fn daily_url(base_url: &str, date: NaiveDate) -> String {
        format!(
            "{}/archive/{}/daily_json.js",
            base_url.trim_end_matches('/'),
            date.format("%Y/%m/%d")
        )
    }
}

/// Rate per one unit of `currency` from a daily document. `Ok(None)` when
/// the document has no quote for the currency.
pub fn parse_daily_json(body: &str, currency: &str) -> Result<Option<f64>, String> {
    let doc: DailyResponse =
        serde_json::from_str(body).map_err(|e| format!("malformed daily document: {}", e))?;
    let Some(quote) = doc.valute.get(currency) else {
        return Ok(None);
    };
    if quote.nominal <= 0.0 {
        return Err(format!("non-positive nominal {} for {}", quote.nominal, currency));
    }
    Ok(Some(quote.value / quote.nominal))
}

impl RateSource for CbrAdapter {
    fn rate_on(&self, date: NaiveDate) -> Result<Option<f64>, FxError> {
        let url = Self::daily_url(&self.settings.base_url, date);
        let fetch_err = |reason: String| FxError::Fetch { date, reason };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;

        if !response.status().is_success() {
            log::debug!("{} returned {}", url, response.status());
            return Ok(None);
        }

        let body = response.text().map_err(|e| fetch_err(e.to_string()))?;
        parse_daily_json(&body, &self.settings.currency).map_err(fetch_err)
    }
}
