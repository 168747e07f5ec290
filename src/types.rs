pub mod current_weather;
pub mod dataset;
pub mod location;
pub mod outcome;
pub mod weather_condition;
