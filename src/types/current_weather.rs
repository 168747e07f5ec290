use crate::types::weather_condition::WeatherCondition;

/// Open-Meteo `current` variables, in the order they are requested and
/// returned. Decoding is positional: index `i` of a response always holds
/// `CURRENT_VARIABLES[i]`.
pub const CURRENT_VARIABLES: [&str; 5] = [
    "temperature_2m",
    "relative_humidity_2m",
    "weather_code",
    "wind_speed_10m",
    "wind_direction_10m",
];

const TEMPERATURE: usize = 0;
const HUMIDITY: usize = 1;
const WEATHER_CODE: usize = 2;
const WIND_SPEED: usize = 3;
const WIND_DIRECTION: usize = 4;

/// Current conditions for one location.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CurrentWeather {
    /// Air temperature 2 m above ground, °C.
    pub temperature: Option<f64>,
    /// Relative humidity 2 m above ground, %.
    pub relative_humidity: Option<f64>,
    /// WMO weather interpretation code.
    pub weather_code: Option<i64>,
    /// Wind speed 10 m above ground, km/h.
    pub wind_speed: Option<f64>,
    /// Wind direction 10 m above ground, degrees.
    pub wind_direction: Option<f64>,
}

impl CurrentWeather {
    /// Builds conditions from positionally ordered values.
    ///
    /// Positions past the end of `values` (the provider returned fewer
    /// variables than requested) are treated as absent.
    pub fn from_positional(values: &[Option<f64>]) -> Self {
        let at = |index: usize| values.get(index).copied().flatten();
        Self {
            temperature: at(TEMPERATURE),
            relative_humidity: at(HUMIDITY),
            weather_code: at(WEATHER_CODE).map(|code| code.round() as i64),
            wind_speed: at(WIND_SPEED),
            wind_direction: at(WIND_DIRECTION),
        }
    }

    pub fn condition(&self) -> Option<WeatherCondition> {
        self.weather_code.and_then(WeatherCondition::from_i64)
    }
}

/// One entry of a batch response: the conditions plus what the provider
/// echoed back about the location it actually used.
#[derive(Debug, PartialEq, Clone)]
pub struct ConditionsReport {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub timezone: Option<String>,
    pub utc_offset_seconds: Option<i64>,
    /// Observation time as a Unix timestamp.
    pub observed_at: Option<i64>,
    pub current: CurrentWeather,
}
