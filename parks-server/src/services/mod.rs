//! Collaborators the HTTP layer delegates to: uploads, weather, map links

pub mod maps;
pub mod storage;
pub mod weather;

pub use maps::MapLinks;
pub use storage::{Bucket, FileStorage, LocalStorage, StorageError, Upload};
pub use weather::{
    CurrentWeather, DailyForecast, Forecast, OpenWeatherClient, WeatherError, WeatherProvider,
};
