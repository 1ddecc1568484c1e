//! Formula 1 race calendar via the Ergast API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

use super::{DataPoint, DataSource};
use crate::config::SourceDescriptor;
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "http://ergast.com";

pub struct F1ErgastSource {
    desc: SourceDescriptor,
    http: reqwest::Client,
}

impl F1ErgastSource {
    pub fn new(desc: SourceDescriptor, http: reqwest::Client) -> Self {
        Self { desc, http }
    }

    async fn next_race(&self) -> Result<Option<Value>, SourceError> {
        let base = self.desc.options.str_or("base_url", DEFAULT_BASE_URL);
        let url = format!("{}/api/f1/current/next.json", base.trim_end_matches('/'));
        let payload = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(payload["MRData"]["RaceTable"]["Races"]
            .as_array()
            .and_then(|races| races.first())
            .cloned())
    }
}

#[async_trait]
impl DataSource for F1ErgastSource {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn refresh_interval(&self) -> Duration {
        self.desc.refresh_interval()
    }

    async fn fetch(&mut self) -> Result<DataPoint, SourceError> {
        match self.next_race().await? {
            Some(race) => Ok(DataPoint::ok(self.name(), describe_race(&race, Utc::now()))),
            None => Ok(DataPoint::warn(self.name(), "No race data")),
        }
    }
}

/// "Race day" framing when the race starts on `now`'s UTC date, otherwise
/// the next race's name, location and date.
pub fn describe_race(race: &Value, now: DateTime<Utc>) -> String {
    let name = race["raceName"].as_str().unwrap_or("Race");
    let location = race_location(race);
    let head = if location.is_empty() {
        name.to_string()
    } else {
        format!("{name} {location}")
    };

    match race_start(race) {
        Some(start) if start.date_naive() == now.date_naive() => {
            format!("Race day: {head} (UTC {})", start.format("%H:%M"))
        }
        _ => format!("Next: {head} on {}", race["date"].as_str().unwrap_or_default()),
    }
}

/// Race start in UTC.  A missing time means midnight.
pub fn race_start(race: &Value) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(race["date"].as_str()?, "%Y-%m-%d").ok()?;
    let time = match race["time"].as_str() {
        Some(t) => NaiveTime::parse_from_str(t.trim_end_matches('Z'), "%H:%M:%S").ok()?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(date.and_time(time).and_utc())
}

fn race_location(race: &Value) -> String {
    let location = &race["Circuit"]["Location"];
    let parts: Vec<&str> = ["locality", "country"]
        .iter()
        .filter_map(|key| location[*key].as_str())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("({})", parts.join(", "))
    }
}
