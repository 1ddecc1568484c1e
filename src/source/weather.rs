//! Current conditions from Open-Meteo.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Number;

use super::{DataPoint, DataSource};
use crate::config::SourceDescriptor;
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

#[derive(Debug, Default, Deserialize)]
struct Forecast {
    #[serde(default)]
    current_weather: CurrentWeather,
}

/// Numbers keep the payload's own formatting, so `22.0` stays `22.0`.
#[derive(Debug, Default, Deserialize)]
struct CurrentWeather {
    temperature: Option<Number>,
    windspeed: Option<Number>,
    weathercode: Option<Number>,
}

impl CurrentWeather {
    fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(t) = &self.temperature {
            parts.push(format!("{t} F"));
        }
        if let Some(w) = &self.windspeed {
            parts.push(format!("wind {w} mph"));
        }
        if let Some(c) = &self.weathercode {
            parts.push(format!("code {c}"));
        }
        if parts.is_empty() {
            "No data".to_string()
        } else {
            parts.join(", ")
        }
    }
}

pub struct OpenMeteoSource {
    desc: SourceDescriptor,
    http: reqwest::Client,
}

impl OpenMeteoSource {
    pub fn new(desc: SourceDescriptor, http: reqwest::Client) -> Self {
        Self { desc, http }
    }
}

#[async_trait]
impl DataSource for OpenMeteoSource {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn refresh_interval(&self) -> Duration {
        self.desc.refresh_interval()
    }

    async fn fetch(&mut self) -> Result<DataPoint, SourceError> {
        let options = &self.desc.options;
        let base = options.str_or("base_url", DEFAULT_BASE_URL);
        let query = [
            ("latitude", options.f64_or("latitude", 0.0).to_string()),
            ("longitude", options.f64_or("longitude", 0.0).to_string()),
            ("current_weather", "true".to_string()),
            ("timezone", options.str_or("timezone", "auto")),
            ("temperature_unit", "fahrenheit".to_string()),
            ("windspeed_unit", "mph".to_string()),
        ];

        let forecast = self
            .http
            .get(format!("{}/v1/forecast", base.trim_end_matches('/')))
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json::<Forecast>()
            .await?;

        Ok(DataPoint::ok(self.name(), forecast.current_weather.summary()))
    }
}
