//! Lookup result types shared with the geocoding and weather clients.
//!
//! These are the values stored in the cache. Field names serialize in
//! camelCase so records written by earlier builds of the trip planner stay
//! readable.

use serde::{Deserialize, Serialize};

/// Coordinates resolved for a free-form address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
}

/// Forecast for one waypoint at its arrival date and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInfo {
    pub location: String,
    pub date: String,
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub weather_condition: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

/// Parameters identifying a weather lookup.
///
/// `date` is `YYYY-MM-DD` and `time` is `HH:mm`, exactly as entered for the
/// waypoint. They are used verbatim in the cache key.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub date: String,
    pub time: String,
}

impl WeatherQuery {
    pub fn new(
        latitude: f64,
        longitude: f64,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            date: date.into(),
            time: time.into(),
        }
    }

    /// Build a query for the coordinates of a geocoded waypoint.
    pub fn at(geocode: &GeocodeResult, date: impl Into<String>, time: impl Into<String>) -> Self {
        Self::new(geocode.latitude, geocode.longitude, date, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_result_uses_camel_case() {
        let result = GeocodeResult {
            latitude: 39.9,
            longitude: 116.4,
            formatted_address: "Beijing".to_string(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"formattedAddress\":\"Beijing\""));
    }

    #[test]
    fn test_weather_info_optional_fields_omitted() {
        let info = WeatherInfo {
            location: "Beijing".to_string(),
            date: "2025-06-01".to_string(),
            time: "09:00".to_string(),
            temperature: 28.0,
            humidity: 40.0,
            wind_speed: 12.0,
            precipitation: 0.0,
            weather_condition: "Sunny".to_string(),
            icon: "100".to_string(),
            feels_like: None,
            pressure: Some(1012.0),
            visibility: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("feelsLike"));
        assert!(json.contains("\"pressure\":1012.0"));

        let back: WeatherInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_weather_query_from_geocode() {
        let geocode = GeocodeResult {
            latitude: 31.2,
            longitude: 121.5,
            formatted_address: "Shanghai".to_string(),
        };
        let query = WeatherQuery::at(&geocode, "2025-06-02", "14:00");
        assert_eq!(query.latitude, 31.2);
        assert_eq!(query.longitude, 121.5);
        assert_eq!(query.time, "14:00");
    }
}
