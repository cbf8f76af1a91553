use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AgentError;

pub const BUDGET_CURRENCIES: [&str; 8] = ["USD", "EUR", "GBP", "JPY", "CAD", "AUD", "INR", "CHF"];

pub const TRANSLATION_TARGETS: [&str; 6] = ["hi", "es", "fr", "de", "ja", "zh"];

const MAX_DURATION_DAYS: u32 = 30;
const MIN_BUDGET: u32 = 100;

/// Fields of the plain web form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub days: u32,
    pub travelers: String,
    pub interests: String,
    pub budget: String,
}

impl TripRequest {
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.destination.trim().is_empty() {
            return Err(AgentError::validation("Please enter a destination."));
        }
        if self.days == 0 {
            return Err(AgentError::validation("The trip must last at least one day."));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[default]
    Summer,
    Winter,
    Rainy,
}

impl Season {
    pub const ALL: [Season; 3] = [Season::Summer, Season::Winter, Season::Rainy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Winter => "winter",
            Season::Rainy => "rainy",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summer" => Ok(Season::Summer),
            "winter" => Ok(Season::Winter),
            "rainy" => Ok(Season::Rainy),
            other => Err(AgentError::validation(format!("Unknown season: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Everything the dashboard collects for one planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub city: String,
    /// Comma separated; blank entries are ignored.
    pub additional_cities: String,
    pub duration: u32,
    pub season: Season,
    pub nationality: String,
    pub budget: u32,
    pub budget_currency: String,
    pub translate_to: Option<String>,
    pub theme: Theme,
}

impl Default for DashboardRequest {
    fn default() -> Self {
        Self {
            city: "Paris".to_string(),
            additional_cities: String::new(),
            duration: 7,
            season: Season::Summer,
            nationality: "United States".to_string(),
            budget: 2000,
            budget_currency: "USD".to_string(),
            translate_to: None,
            theme: Theme::Light,
        }
    }
}

impl DashboardRequest {
    pub fn destinations(&self) -> Vec<String> {
        std::iter::once(self.city.trim())
            .chain(self.additional_cities.split(','))
            .map(str::trim)
            .filter(|city| !city.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.city.trim().is_empty() {
            return Err(AgentError::validation("Please enter at least one destination."));
        }
        if !(1..=MAX_DURATION_DAYS).contains(&self.duration) {
            return Err(AgentError::validation(format!(
                "Trip duration must be between 1 and {MAX_DURATION_DAYS} days."
            )));
        }
        if self.budget < MIN_BUDGET {
            return Err(AgentError::validation(format!(
                "The total budget must be at least {MIN_BUDGET}."
            )));
        }
        if !BUDGET_CURRENCIES.contains(&self.budget_currency.as_str()) {
            return Err(AgentError::validation(format!(
                "Unsupported budget currency: {}",
                self.budget_currency
            )));
        }
        if let Some(lang) = &self.translate_to {
            if !TRANSLATION_TARGETS.contains(&lang.as_str()) {
                return Err(AgentError::validation(format!(
                    "Unsupported translation language: {lang}"
                )));
            }
        }
        Ok(())
    }

    pub fn download_file_name(&self) -> String {
        format!("travel_plan_{}_Pro.txt", self.city.trim().replace(' ', "_"))
    }
}

/// Splits model output into trimmed, non-blank display lines.
pub fn itinerary_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_merge_primary_and_additional_cities() {
        let req = DashboardRequest {
            city: " Tokyo ".into(),
            additional_cities: "Kyoto, ,Osaka ,".into(),
            ..Default::default()
        };
        assert_eq!(req.destinations(), vec!["Tokyo", "Kyoto", "Osaka"]);
    }

    #[test]
    fn blank_city_is_rejected() {
        let req = DashboardRequest {
            city: "   ".into(),
            additional_cities: "Kyoto".into(),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let long = DashboardRequest {
            duration: 31,
            ..Default::default()
        };
        assert!(long.validate().is_err());

        let cheap = DashboardRequest {
            budget: 50,
            ..Default::default()
        };
        assert!(cheap.validate().is_err());

        let klingon = DashboardRequest {
            translate_to: Some("tlh".into()),
            ..Default::default()
        };
        assert!(klingon.validate().is_err());

        assert!(DashboardRequest::default().validate().is_ok());
    }

    #[test]
    fn download_name_replaces_spaces() {
        let req = DashboardRequest {
            city: "New York".into(),
            ..Default::default()
        };
        assert_eq!(req.download_file_name(), "travel_plan_New_York_Pro.txt");
    }

    #[test]
    fn trip_request_needs_destination_and_days() {
        let mut req = TripRequest {
            destination: "Paris".into(),
            days: 3,
            travelers: "2".into(),
            interests: "museums".into(),
            budget: "1500 EUR".into(),
        };
        assert!(req.validate().is_ok());
        req.days = 0;
        assert!(req.validate().is_err());
        req.days = 3;
        req.destination = " ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn season_parses_case_insensitively() {
        assert_eq!("Winter".parse::<Season>().unwrap(), Season::Winter);
        assert!("monsoon".parse::<Season>().is_err());
    }

    #[test]
    fn itinerary_lines_drop_blank_lines() {
        let lines = itinerary_lines("<h3>Day 1</h3>\n\n   \n  <p>Louvre</p>  \n");
        assert_eq!(lines, vec!["<h3>Day 1</h3>", "<p>Louvre</p>"]);
    }
}
