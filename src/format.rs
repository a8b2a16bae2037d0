//! Status line rendering
//!
//! Substitutes observation values into the user's output template. The
//! template is kept unmodified; every rendering starts from it again.

use crate::models::Observation;

pub const TEMPERATURE_FAHRENHEIT: &str = "%temperature-fahrenheit%";
pub const TEMPERATURE_CELSIUS: &str = "%temperature-celcius%";
pub const BAROMETER: &str = "%barometer%";
pub const WIND_SPEED: &str = "%wind-speed%";
pub const WIND_DIRECTION: &str = "%wind-direction%";
pub const WIND_CARDINAL: &str = "%wind-cardinal%";
pub const STATION_ID: &str = "%station-id%";

/// Every placeholder understood by [`Formatter`]
pub const PLACEHOLDERS: [&str; 7] = [
    TEMPERATURE_FAHRENHEIT,
    TEMPERATURE_CELSIUS,
    BAROMETER,
    WIND_SPEED,
    WIND_DIRECTION,
    WIND_CARDINAL,
    STATION_ID,
];

/// Renders observations into single status lines
#[derive(Debug, Clone)]
pub struct Formatter {
    template: String,
}

impl Formatter {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the template references at least one placeholder
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        PLACEHOLDERS.iter().any(|p| self.template.contains(p))
    }

    /// Render one observation
    #[must_use]
    pub fn render(&self, observation: &Observation) -> String {
        self.template
            .replace(
                TEMPERATURE_FAHRENHEIT,
                &format!("{:.1}", observation.temperature),
            )
            .replace(
                TEMPERATURE_CELSIUS,
                &format!("{:.1}", observation.temperature_celsius()),
            )
            .replace(BAROMETER, &format!("{:.2}", observation.pressure))
            .replace(WIND_SPEED, &observation.wind_speed.to_string())
            .replace(WIND_DIRECTION, &observation.wind_direction.to_string())
            .replace(WIND_CARDINAL, observation.wind_cardinal())
            .replace(STATION_ID, &observation.station_id)
    }
}
