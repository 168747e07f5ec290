//! Defines the `WeatherCondition` enum, mapping the WMO weather interpretation
//! codes reported by Open-Meteo's `weather_code` variable to descriptive variants.

/// Represents a WMO weather interpretation code (WW).
///
/// Open-Meteo reports the current condition as an integer in the
/// `weather_code` variable. Only the subset of WMO codes that Open-Meteo
/// emits is modelled; see the
/// [Open-Meteo documentation](https://open-meteo.com/en/docs#weather_variable_documentation).
///
/// # Examples
///
/// ```rust
/// use weather_collector::WeatherCondition;
///
/// assert_eq!(WeatherCondition::from_i64(61), Some(WeatherCondition::SlightRain));
/// assert_eq!(WeatherCondition::from_i64(42), None);
/// assert_eq!(WeatherCondition::Thunderstorm.description(), "Thunderstorm");
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WeatherCondition {
    /// Code 0: Clear sky.
    ClearSky = 0,
    /// Code 1: Mainly clear.
    MainlyClear = 1,
    /// Code 2: Partly cloudy.
    PartlyCloudy = 2,
    /// Code 3: Overcast.
    Overcast = 3,
    /// Code 45: Fog.
    Fog = 45,
    /// Code 48: Depositing rime fog.
    RimeFog = 48,
    /// Code 51: Light drizzle.
    LightDrizzle = 51,
    /// Code 53: Moderate drizzle.
    Drizzle = 53,
    /// Code 55: Dense drizzle.
    DenseDrizzle = 55,
    /// Code 56: Light freezing drizzle.
    LightFreezingDrizzle = 56,
    /// Code 57: Dense freezing drizzle.
    DenseFreezingDrizzle = 57,
    /// Code 61: Slight rain.
    SlightRain = 61,
    /// Code 63: Moderate rain.
    Rain = 63,
    /// Code 65: Heavy rain.
    HeavyRain = 65,
    /// Code 66: Light freezing rain.
    LightFreezingRain = 66,
    /// Code 67: Heavy freezing rain.
    HeavyFreezingRain = 67,
    /// Code 71: Slight snowfall.
    SlightSnowfall = 71,
    /// Code 73: Moderate snowfall.
    Snowfall = 73,
    /// Code 75: Heavy snowfall.
    HeavySnowfall = 75,
    /// Code 77: Snow grains.
    SnowGrains = 77,
    /// Code 80: Slight rain showers.
    SlightRainShowers = 80,
    /// Code 81: Moderate rain showers.
    RainShowers = 81,
    /// Code 82: Violent rain showers.
    ViolentRainShowers = 82,
    /// Code 85: Slight snow showers.
    SlightSnowShowers = 85,
    /// Code 86: Heavy snow showers.
    HeavySnowShowers = 86,
    /// Code 95: Slight or moderate thunderstorm.
    Thunderstorm = 95,
    /// Code 96: Thunderstorm with slight hail.
    ThunderstormSlightHail = 96,
    /// Code 99: Thunderstorm with heavy hail.
    ThunderstormHeavyHail = 99,
}

impl WeatherCondition {
    /// Attempts to convert a WMO weather code into a `WeatherCondition` variant.
    ///
    /// Returns `None` for codes Open-Meteo does not emit.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(WeatherCondition::ClearSky),
            1 => Some(WeatherCondition::MainlyClear),
            2 => Some(WeatherCondition::PartlyCloudy),
            3 => Some(WeatherCondition::Overcast),
            45 => Some(WeatherCondition::Fog),
            48 => Some(WeatherCondition::RimeFog),
            51 => Some(WeatherCondition::LightDrizzle),
            53 => Some(WeatherCondition::Drizzle),
            55 => Some(WeatherCondition::DenseDrizzle),
            56 => Some(WeatherCondition::LightFreezingDrizzle),
            57 => Some(WeatherCondition::DenseFreezingDrizzle),
            61 => Some(WeatherCondition::SlightRain),
            63 => Some(WeatherCondition::Rain),
            65 => Some(WeatherCondition::HeavyRain),
            66 => Some(WeatherCondition::LightFreezingRain),
            67 => Some(WeatherCondition::HeavyFreezingRain),
            71 => Some(WeatherCondition::SlightSnowfall),
            73 => Some(WeatherCondition::Snowfall),
            75 => Some(WeatherCondition::HeavySnowfall),
            77 => Some(WeatherCondition::SnowGrains),
            80 => Some(WeatherCondition::SlightRainShowers),
            81 => Some(WeatherCondition::RainShowers),
            82 => Some(WeatherCondition::ViolentRainShowers),
            85 => Some(WeatherCondition::SlightSnowShowers),
            86 => Some(WeatherCondition::HeavySnowShowers),
            95 => Some(WeatherCondition::Thunderstorm),
            96 => Some(WeatherCondition::ThunderstormSlightHail),
            99 => Some(WeatherCondition::ThunderstormHeavyHail),
            _ => None,
        }
    }

    /// Short human readable label, stored next to the numeric code.
    pub fn description(&self) -> &'static str {
        match self {
            WeatherCondition::ClearSky => "Clear sky",
            WeatherCondition::MainlyClear => "Mainly clear",
            WeatherCondition::PartlyCloudy => "Partly cloudy",
            WeatherCondition::Overcast => "Overcast",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::RimeFog => "Depositing rime fog",
            WeatherCondition::LightDrizzle => "Light drizzle",
            WeatherCondition::Drizzle => "Moderate drizzle",
            WeatherCondition::DenseDrizzle => "Dense drizzle",
            WeatherCondition::LightFreezingDrizzle => "Light freezing drizzle",
            WeatherCondition::DenseFreezingDrizzle => "Dense freezing drizzle",
            WeatherCondition::SlightRain => "Slight rain",
            WeatherCondition::Rain => "Moderate rain",
            WeatherCondition::HeavyRain => "Heavy rain",
            WeatherCondition::LightFreezingRain => "Light freezing rain",
            WeatherCondition::HeavyFreezingRain => "Heavy freezing rain",
            WeatherCondition::SlightSnowfall => "Slight snowfall",
            WeatherCondition::Snowfall => "Moderate snowfall",
            WeatherCondition::HeavySnowfall => "Heavy snowfall",
            WeatherCondition::SnowGrains => "Snow grains",
            WeatherCondition::SlightRainShowers => "Slight rain showers",
            WeatherCondition::RainShowers => "Moderate rain showers",
            WeatherCondition::ViolentRainShowers => "Violent rain showers",
            WeatherCondition::SlightSnowShowers => "Slight snow showers",
            WeatherCondition::HeavySnowShowers => "Heavy snow showers",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::ThunderstormSlightHail => "Thunderstorm with slight hail",
            WeatherCondition::ThunderstormHeavyHail => "Thunderstorm with heavy hail",
        }
    }
}
