use chrono::{DateTime, Utc};
use serde::Deserialize;
use tidewatch_core::{Filter, State};

use crate::{Content, HourForecast, WeatherSnapshot, WindDirection};

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    service: Option<String>,
    date_time: DateTime<Utc>,
    hours: Vec<RawHour>,
}

#[derive(Debug, Deserialize)]
struct RawHour {
    hour_index: u32,
    temperature: f64,
    felt_temperature: Option<f64>,
    rain_probability: f64,
    #[serde(default)]
    rain_amount: f64,
    /// Compass label such as `NNE`.
    wind_direction: Option<String>,
    wind_degrees: Option<f64>,
    #[serde(default)]
    wind_speed: f64,
    gust_speed: Option<f64>,
    humidity: Option<f64>,
    #[serde(default)]
    description: String,
    image: Option<String>,
}

impl RawHour {
    fn into_forecast(self) -> HourForecast {
        let wind_direction = match (self.wind_direction.as_deref(), self.wind_degrees) {
            (Some(label), _) => WindDirection::from_label(label),
            (None, Some(degrees)) => WindDirection::from_degrees(degrees),
            (None, None) => WindDirection::None,
        };
        HourForecast {
            hour_index: self.hour_index,
            temperature: self.temperature,
            felt_temperature: self.felt_temperature,
            rain_probability: self.rain_probability,
            rain_amount: self.rain_amount,
            wind_direction,
            wind_speed: self.wind_speed,
            gust_speed: self.gust_speed,
            humidity: self.humidity,
            description: self.description,
            image: self.image,
        }
    }
}

/// Parses a JSON forecast document (from a text or HTTP payload) into a
/// weather snapshot.
#[derive(Debug, Clone, Default)]
pub struct WeatherJsonFilter {
    service: Option<String>,
    max_hours: Option<usize>,
}

impl WeatherJsonFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service name used when the document does not carry one.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Keeps only the first `max_hours` hours of the forecast.
    pub fn with_max_hours(mut self, max_hours: usize) -> Self {
        self.max_hours = Some(max_hours);
        self
    }

    fn parse(&self, json: &str) -> State<Content> {
        let raw: RawSnapshot = match serde_json::from_str(json) {
            Ok(raw) => raw,
            Err(err) => return State::failure(format!("invalid weather document: {err}")),
        };
        let service = raw
            .service
            .or_else(|| self.service.clone())
            .unwrap_or_else(|| "unknown service".to_string());
        let limit = self.max_hours.unwrap_or(usize::MAX);
        State::success(Content::Weather(WeatherSnapshot {
            service,
            date_time: raw.date_time,
            hours: raw
                .hours
                .into_iter()
                .take(limit)
                .map(RawHour::into_forecast)
                .collect(),
        }))
    }
}

impl Filter<Content> for WeatherJsonFilter {
    fn name(&self) -> &str {
        "weather-json"
    }

    fn apply(&self, state: State<Content>) -> State<Content> {
        state.and_then(|content| match content {
            Content::Text(text) => self.parse(&text),
            Content::Http(document) => self.parse(&document.body),
            other => State::failure(other.mismatch("text")),
        })
    }
}
