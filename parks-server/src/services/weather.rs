//! Weather lookups through OpenWeatherMap
//!
//! Responses are normalised to metric values with French descriptions.
//! Handlers only see [`WeatherProvider`], so tests can swap in a stub.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WeatherConfig;
use crate::models::Coordinates;

pub const MAX_FORECAST_DAYS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather API key not configured")]
    NotConfigured,

    #[error("weather request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather provider returned status {0}")]
    Status(u16),

    #[error("unexpected weather payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: i64,
    pub feels_like: i64,
    pub temp_min: i64,
    pub temp_max: i64,
    pub humidity: i64,
    pub pressure: i64,
    pub description: String,
    pub icon: String,
    pub icon_url: String,
    /// km/h
    pub wind_speed: f64,
    pub wind_direction: i64,
    pub clouds: i64,
    /// km
    pub visibility: f64,
    pub sunrise: i64,
    pub sunset: i64,
    pub timezone: i64,
    pub city_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub temperature: i64,
    pub temp_min: i64,
    pub temp_max: i64,
    pub description: String,
    pub icon: String,
    pub icon_url: String,
    pub humidity: i64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: String,
    pub country: String,
    pub forecasts: Vec<DailyForecast>,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, at: Coordinates) -> Result<CurrentWeather, WeatherError>;

    /// Up to `days` daily entries (capped at [`MAX_FORECAST_DAYS`]).
    async fn forecast(&self, at: Coordinates, days: usize) -> Result<Forecast, WeatherError>;
}

// Upstream payload shapes (only the fields we read)

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: i64,
    #[serde(default)]
    pressure: i64,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct RawWind {
    speed: f64,
    #[serde(default)]
    deg: i64,
}

#[derive(Debug, Default, Deserialize)]
struct RawClouds {
    #[serde(default)]
    all: i64,
}

#[derive(Debug, Default, Deserialize)]
struct RawSys {
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    main: RawMain,
    weather: Vec<RawCondition>,
    wind: RawWind,
    #[serde(default)]
    clouds: RawClouds,
    #[serde(default)]
    visibility: f64,
    #[serde(default)]
    sys: RawSys,
    #[serde(default)]
    timezone: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawForecastItem {
    dt_txt: String,
    main: RawMain,
    weather: Vec<RawCondition>,
    wind: RawWind,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    list: Vec<RawForecastItem>,
    city: RawCity,
}

fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// m/s to km/h, one decimal
fn kmh(speed_ms: f64) -> f64 {
    (speed_ms * 3.6 * 10.0).round() / 10.0
}

fn first_condition(weather: Vec<RawCondition>) -> Result<RawCondition, WeatherError> {
    weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Malformed("empty weather list".into()))
}

impl CurrentWeather {
    fn from_raw(raw: RawCurrent) -> Result<Self, WeatherError> {
        let condition = first_condition(raw.weather)?;
        Ok(Self {
            temperature: raw.main.temp.round() as i64,
            feels_like: raw.main.feels_like.round() as i64,
            temp_min: raw.main.temp_min.round() as i64,
            temp_max: raw.main.temp_max.round() as i64,
            humidity: raw.main.humidity,
            pressure: raw.main.pressure,
            icon_url: icon_url(&condition.icon),
            description: condition.description,
            icon: condition.icon,
            wind_speed: kmh(raw.wind.speed),
            wind_direction: raw.wind.deg,
            clouds: raw.clouds.all,
            visibility: raw.visibility / 1000.0,
            sunrise: raw.sys.sunrise,
            sunset: raw.sys.sunset,
            timezone: raw.timezone,
            city_name: raw.name,
        })
    }
}

impl Forecast {
    /// Keep the 12:00:00 entry of each date, first `days` dates only.
    fn from_raw(raw: RawForecast, days: usize) -> Result<Self, WeatherError> {
        let mut forecasts: Vec<DailyForecast> = Vec::new();
        for item in raw.list {
            if forecasts.len() >= days {
                break;
            }
            let Some((date, time)) = item.dt_txt.split_once(' ') else {
                continue;
            };
            if time != "12:00:00" || forecasts.iter().any(|f| f.date == date) {
                continue;
            }
            let condition = first_condition(item.weather)?;
            forecasts.push(DailyForecast {
                date: date.to_owned(),
                temperature: item.main.temp.round() as i64,
                temp_min: item.main.temp_min.round() as i64,
                temp_max: item.main.temp_max.round() as i64,
                icon_url: icon_url(&condition.icon),
                description: condition.description,
                icon: condition.icon,
                humidity: item.main.humidity,
                wind_speed: kmh(item.wind.speed),
            });
        }

        Ok(Self {
            city: raw.city.name,
            country: raw.city.country,
            forecasts,
        })
    }
}

/// HTTP client for the OpenWeatherMap 2.5 API
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        at: Coordinates,
    ) -> Result<T, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::NotConfigured)?;
        let url = format!("{}/{}", self.base_url, endpoint);
        let lat = at.latitude.to_string();
        let lon = at.longitude.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", "metric"),
                ("lang", "fr"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "Weather provider error");
            return Err(WeatherError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| WeatherError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, at: Coordinates) -> Result<CurrentWeather, WeatherError> {
        let raw: RawCurrent = self.fetch("weather", at).await?;
        CurrentWeather::from_raw(raw)
    }

    async fn forecast(&self, at: Coordinates, days: usize) -> Result<Forecast, WeatherError> {
        let raw: RawForecast = self.fetch("forecast", at).await?;
        Forecast::from_raw(raw, days.clamp(1, MAX_FORECAST_DAYS))
    }
}
