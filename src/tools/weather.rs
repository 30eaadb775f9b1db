//! Stateless weather stub.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherTool;

impl WeatherTool {
    /// Identifier used in `enabledTools`.
    pub const ID: &'static str = "weather";
    pub const NAME: &'static str = "getWeather";
    pub const DESCRIPTION: &'static str = "Get the current weather for a location";

    pub fn get_weather(&self, location: &str) -> String {
        format!(
            "The weather in {} is sunny and 25 degrees Celsius.",
            location
        )
    }
}
