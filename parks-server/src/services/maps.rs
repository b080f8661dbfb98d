//! Google Maps deep links for a park

use serde::Serialize;

use crate::models::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLinks {
    pub latitude: f64,
    pub longitude: f64,
    pub google_maps_url: String,
    pub directions_url: String,
    pub embed_url: String,
}

impl MapLinks {
    pub fn new(at: Coordinates, origin: Option<Coordinates>) -> Self {
        Self {
            latitude: at.latitude,
            longitude: at.longitude,
            google_maps_url: search_url(at),
            directions_url: directions_url(at, origin),
            embed_url: embed_url(at),
        }
    }
}

pub fn search_url(at: Coordinates) -> String {
    format!("https://www.google.com/maps?q={},{}", at.latitude, at.longitude)
}

/// Without an origin the map app starts from the user's position.
pub fn directions_url(destination: Coordinates, origin: Option<Coordinates>) -> String {
    let mut url = format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}",
        destination.latitude, destination.longitude
    );
    if let Some(origin) = origin {
        url.push_str(&format!("&origin={},{}", origin.latitude, origin.longitude));
    }
    url
}

pub fn embed_url(at: Coordinates) -> String {
    format!(
        "https://maps.google.com/maps?q={},{}&z=12&output=embed",
        at.latitude, at.longitude
    )
}
