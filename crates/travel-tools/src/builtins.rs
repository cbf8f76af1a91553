//! The seven travel tools offered to the model.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::{json, Value};
use travel_core::{warning, WARNING_MARKER};

use crate::{
    decode, number_arg, optional_str, request_error, required_str, Tool, ToolEndpoints,
    ToolError, ToolRegistry,
};

const NOMINATIM_USER_AGENT: &str = "TravelPlannerApp";
const DEFAULT_PLACE_LIMIT: u64 = 5;
const MAX_PLACE_LIMIT: u64 = 10;
const DEFAULT_FORECAST_DAYS: u64 = 3;
const MAX_FORECAST_DAYS: u64 = 16;
const TRANSLATION_MAX_LENGTH: u32 = 512;

/// Registry holding every travel tool, sharing one HTTP client.
pub fn travel_registry(endpoints: &ToolEndpoints) -> Result<ToolRegistry, ToolError> {
    let client = reqwest::Client::builder()
        .timeout(endpoints.timeout)
        .build()
        .map_err(request_error)?;

    let mut registry = ToolRegistry::new();
    registry.register(TranslatorTool {
        client: client.clone(),
        base_url: endpoints.translation_url.clone(),
        token: endpoints.translation_token.clone(),
    });
    registry.register(PlaceFinderTool {
        client: client.clone(),
        base_url: endpoints.nominatim_url.clone(),
    });
    registry.register(WeatherForecastTool {
        client: client.clone(),
        geocoding_url: endpoints.geocoding_url.clone(),
        forecast_url: endpoints.forecast_url.clone(),
    });
    registry.register(CurrencyConverterTool {
        client,
        base_url: endpoints.exchange_rate_url.clone(),
        access_key: endpoints.exchange_rate_access_key.clone(),
    });
    registry.register(FlightInfoTool);
    registry.register(TravelAdvisoryTool);
    registry.register(PackingListTool);
    Ok(registry)
}

fn url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub struct TranslatorTool {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct Translation {
    translation_text: String,
}

impl TranslatorTool {
    async fn translate(&self, text: &str, language: &str) -> Result<String, ToolError> {
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(ToolError::InvalidArgs(format!(
                "unsupported language code: {language}"
            )));
        }
        let endpoint = url(&self.base_url, &format!("Helsinki-NLP/opus-mt-en-{language}"));
        let mut request = self.client.post(endpoint).json(&json!({
            "inputs": text,
            "parameters": {"max_length": TRANSLATION_MAX_LENGTH},
        }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await.map_err(request_error)?;
        let translations: Vec<Translation> = decode(resp).await?;
        translations
            .into_iter()
            .next()
            .map(|t| t.translation_text)
            .ok_or_else(|| ToolError::InvalidResponse("no translation returned".into()))
    }
}

#[async_trait]
impl Tool for TranslatorTool {
    fn name(&self) -> &'static str {
        "translator"
    }

    fn description(&self) -> &'static str {
        "Translate text to a specified language."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"},
                "language": {"type": "string", "description": "Target language code, e.g. hi, es, fr", "default": "hi"}
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let text = required_str(&args, "text")?;
        let language = optional_str(&args, "language").unwrap_or("hi");
        tracing::info!(tool = "translator", %language, "translating text");
        match self.translate(text, language).await {
            Ok(translated) => Ok(translated),
            Err(err) => Ok(format!("{WARNING_MARKER} [Translation error: {err}]\n{text}")),
        }
    }
}

pub struct PlaceFinderTool {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct Place {
    display_name: String,
}

#[async_trait]
impl Tool for PlaceFinderTool {
    fn name(&self) -> &'static str {
        "place_finder"
    }

    fn description(&self) -> &'static str {
        "Find places like hotels, restaurants, or attractions in a given location."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "place": {"type": "string"},
                "category": {"type": "string", "default": "hotel"},
                "limit": {"type": "integer", "minimum": 1, "maximum": MAX_PLACE_LIMIT, "default": DEFAULT_PLACE_LIMIT}
            },
            "required": ["place"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let place = required_str(&args, "place")?;
        let category = optional_str(&args, "category").unwrap_or("hotel");
        let limit = number_arg(&args, "limit")?
            .map(|n| n as u64)
            .unwrap_or(DEFAULT_PLACE_LIMIT)
            .clamp(1, MAX_PLACE_LIMIT)
            .to_string();
        tracing::info!(tool = "place_finder", %place, %category, "searching places");

        let query = format!("{category} in {place}");
        let resp = self
            .client
            .get(url(&self.base_url, "search"))
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", limit.as_str())])
            .header(USER_AGENT, NOMINATIM_USER_AGENT)
            .send()
            .await
            .map_err(request_error)?;
        let places: Vec<Place> = decode(resp).await?;

        if places.is_empty() {
            return Ok(warning(format!("No {category}s found in {place}")));
        }
        let lines: Vec<String> = places
            .iter()
            .map(|p| format!("- {}", p.display_name))
            .collect();
        Ok(format!(
            "📍 {}s in {place}:\n{}",
            title_case(category),
            lines.join("\n")
        ))
    }
}

pub struct WeatherForecastTool {
    client: reqwest::Client,
    geocoding_url: String,
    forecast_url: String,
}

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeoResult>>,
}

#[derive(Deserialize)]
struct GeoResult {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct ForecastResponse {
    daily: Option<DailyForecast>,
}

#[derive(Deserialize)]
struct DailyForecast {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
}

fn celsius(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &'static str {
        "weather_forecast"
    }

    fn description(&self) -> &'static str {
        "Get a daily weather forecast (3 days by default) for a city."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string"},
                "days": {"type": "integer", "minimum": 1, "maximum": MAX_FORECAST_DAYS, "default": DEFAULT_FORECAST_DAYS}
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let city = required_str(&args, "city")?;
        let days = number_arg(&args, "days")?
            .map(|n| n as u64)
            .unwrap_or(DEFAULT_FORECAST_DAYS)
            .clamp(1, MAX_FORECAST_DAYS);
        tracing::info!(tool = "weather_forecast", %city, days, "fetching forecast");

        let resp = self
            .client
            .get(url(&self.geocoding_url, "search"))
            .query(&[("name", city), ("count", "1")])
            .send()
            .await
            .map_err(request_error)?;
        let geo: GeocodingResponse = decode(resp).await?;
        let Some(location) = geo.results.and_then(|r| r.into_iter().next()) else {
            return Ok(warning(format!("Could not find location for {city}")));
        };

        let params = [
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("daily", "temperature_2m_max,temperature_2m_min".to_string()),
            ("forecast_days", days.to_string()),
            ("timezone", "auto".to_string()),
        ];
        let resp = self
            .client
            .get(url(&self.forecast_url, "forecast"))
            .query(&params)
            .send()
            .await
            .map_err(request_error)?;
        let forecast: ForecastResponse = decode(resp).await?;
        let daily = forecast
            .daily
            .ok_or_else(|| ToolError::InvalidResponse("forecast has no daily block".into()))?;

        let lines: Vec<String> = daily
            .time
            .iter()
            .zip(daily.temperature_2m_min.iter().zip(daily.temperature_2m_max.iter()))
            .map(|(day, (min, max))| format!("{day}: {}°C - {}°C", celsius(*min), celsius(*max)))
            .collect();
        // Open-Meteo may return fewer days than requested.
        Ok(format!(
            "🌤 {}-day forecast for {city}:\n{}",
            lines.len(),
            lines.join("\n")
        ))
    }
}

pub struct CurrencyConverterTool {
    client: reqwest::Client,
    base_url: String,
    access_key: Option<String>,
}

#[async_trait]
impl Tool for CurrencyConverterTool {
    fn name(&self) -> &'static str {
        "currency_converter"
    }

    fn description(&self) -> &'static str {
        "Convert amount between currencies."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "amount": {"type": "number"},
                "from_currency": {"type": "string"},
                "to_currency": {"type": "string", "default": "USD"}
            },
            "required": ["amount", "from_currency"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let amount = number_arg(&args, "amount")?
            .ok_or_else(|| ToolError::InvalidArgs("amount missing".into()))?;
        let from = required_str(&args, "from_currency")?.to_uppercase();
        let to = optional_str(&args, "to_currency")
            .unwrap_or("USD")
            .to_uppercase();
        tracing::info!(tool = "currency_converter", amount, %from, %to, "converting currency");

        let mut params = vec![
            ("from", from.clone()),
            ("to", to.clone()),
            ("amount", amount.to_string()),
        ];
        if let Some(key) = &self.access_key {
            params.push(("access_key", key.clone()));
        }
        let resp = self
            .client
            .get(url(&self.base_url, "convert"))
            .query(&params)
            .send()
            .await
            .map_err(request_error)?;
        let body: Value = decode(resp).await?;

        match body.get("result").and_then(Value::as_f64) {
            Some(result) => Ok(format!("{amount} {from} = {result:.2} {to}")),
            None => Ok(warning("Conversion failed")),
        }
    }
}

/// Canned flight listing until a real flight search backend exists.
pub struct FlightInfoTool;

#[async_trait]
impl Tool for FlightInfoTool {
    fn name(&self) -> &'static str {
        "flight_info"
    }

    fn description(&self) -> &'static str {
        "Get flight information between two cities."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source": {"type": "string"},
                "destination": {"type": "string"}
            },
            "required": ["source", "destination"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let source = required_str(&args, "source")?;
        let destination = required_str(&args, "destination")?;
        Ok(format!(
            "✈️ Example flights from {source} to {destination}:\n\
             - Airline A: $350 (6h)\n\
             - Airline B: $420 (non-stop)\n\
             - Airline C: $300 (1 stop)"
        ))
    }
}

pub struct TravelAdvisoryTool;

#[async_trait]
impl Tool for TravelAdvisoryTool {
    fn name(&self) -> &'static str {
        "travel_advisory"
    }

    fn description(&self) -> &'static str {
        "Fetch latest travel advisory for a city."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"city": {"type": "string"}},
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let city = required_str(&args, "city")?;
        Ok(warning(format!(
            "Always check your embassy website for advisories before traveling to {city}."
        )))
    }
}

pub struct PackingListTool;

impl PackingListTool {
    fn items(season: &str) -> &'static [&'static str] {
        match season.to_lowercase().as_str() {
            "summer" => &["T-shirts", "Shorts", "Sunscreen", "Hat", "Light shoes"],
            "winter" => &["Jacket", "Sweater", "Gloves", "Scarf", "Boots"],
            "rainy" => &["Raincoat", "Umbrella", "Waterproof shoes"],
            _ => &["General clothes", "Shoes", "Toiletries"],
        }
    }
}

#[async_trait]
impl Tool for PackingListTool {
    fn name(&self) -> &'static str {
        "packing_list"
    }

    fn description(&self) -> &'static str {
        "Suggest a simple packing list based on season."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string"},
                "season": {"type": "string", "enum": ["summer", "winter", "rainy"], "default": "summer"}
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let city = required_str(&args, "city")?;
        let season = optional_str(&args, "season").unwrap_or("summer");
        Ok(format!(
            "🧳 Suggested packing list for {city} in {season}:\n- {}",
            Self::items(season).join("\n- ")
        ))
    }
}
