//! Natural-language prompt templates sent as the first user message.

use crate::{DashboardRequest, TripRequest};

pub fn form_prompt(req: &TripRequest) -> String {
    format!(
        r#"You are a professional travel planner.
Plan a {days}-day trip to {destination} for {travelers}.
Traveler interests: {interests}.
Budget: {budget}.

Include:
- Morning, Afternoon, Evening activities
- Food recommendations
- Estimated budget per day
- Travel tips
- Alternatives for rainy/rest days
- Packing checklist at the end

Output format requirement:
Return the response in pure HTML using <div>, <h3>, <ul>, <li>, <p> etc.
Do not include Markdown (#, ##) or extra text outside HTML.
The HTML must be clean and ready to insert inside an itinerary container."#,
        days = req.days,
        destination = req.destination.trim(),
        travelers = req.travelers.trim(),
        interests = non_empty_or(&req.interests, "general sightseeing"),
        budget = non_empty_or(&req.budget, "flexible"),
    )
}

pub fn dashboard_prompt(req: &DashboardRequest) -> String {
    let destinations = req.destinations().join(", ");
    let duration = req.duration;
    let budget = format!("{} {}", req.budget, req.budget_currency);
    let translation = match &req.translate_to {
        Some(lang) => format!("Translate the final guide into `{lang}` with `translator`."),
        None => "No translation needed; keep the guide in English.".to_string(),
    };

    format!(
        r#"You are an expert travel planner AI. Create a {duration}-day travel guide
for {nationality} visiting {destinations} during {season}, with a total
budget of {budget} (convert into local currencies).

USE TOOLS IN ORDER:
1. `place_finder`: Top 10 hotels + 10 attractions per city.
   - For attractions: why unique, how to reach, transport cost/time, best visiting hours, ticket rules, nearby food.
2. `weather_forecast`: {duration}-day forecast per city.
3. `packing_list`: Clothing suggestions for {season}.
4. `currency_converter`: Convert {budget} to each city's local currency.
5. `travel_advisory`: Safety tips and advisories per city.
6. `flight_info`: Flights from {nationality} to each city.
7. {translation}

OUTPUT STRUCTURE:
# Travel Guide: {destinations}

- **Itinerary Overview**: trip duration, cities, traveler profile.
- **Budget Breakdown**: {budget} -> local currencies, daily costs, leftover.
- **Entry & Visa Rules**: Visa (Y/N), e-Visa, passport validity, health forms.
- **Docs & Links**: Embassy, emergency numbers, transport apps, government advisories.
- **Laws & Regulations**: Dress code, photography, alcohol/drugs, public norms, drones, internet rules.
- **Hotels & Attractions**: Top 10 hotels + 10 attractions with details.
- **Transport Guide**: metro/bus/taxi/walking in 5 lines.
- **Weather Forecast**: {duration}-day per city.
- **Packing List**: 3 lines clothing tips.
- **Flights**: Airlines, prices, durations, booking links.
- **Cultural Insights**: 1-2 key facts per city.
- **Local Tips & Hidden Gems**: Festivals, markets, free-entry days.
- **Final Notes**: Safety, respect traditions, offline maps, embassy registration."#,
        nationality = req.nationality.trim(),
        season = req.season,
    )
}

/// The one-shot request used by the command line `plan` subcommand.
pub fn quick_prompt(city: &str) -> String {
    format!(
        "I want to travel to {city}. Suggest main attractions, explain in Hindi, \
         give me a packing list for summer, check weather, and find hotels."
    )
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
