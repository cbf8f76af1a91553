//! Server-rendered HTML for both front ends.
//!
//! Request fields are always escaped. Model output is inserted as markup, since
//! the prompts ask the model for ready-to-embed HTML.

use std::fmt::Write as _;

use travel_core::{DashboardRequest, Season, Theme, TripRequest, BUDGET_CURRENCIES, TRANSLATION_TARGETS};
use travel_runtime::DashboardPlan;

const STYLE: &str = r#"
body { font-family: 'Segoe UI', sans-serif; margin: 0; background: #f5f7fa; color: #222; }
[data-theme="dark"] { background: #121212; color: #eaeaea; }
.header { display: flex; align-items: center; gap: 15px; background: #1e1e1e; padding: 15px 24px; }
.header h1 { color: #eaeaea; margin: 0; }
.badge { background: #4caf50; color: white; padding: 4px 8px; border-radius: 8px; font-size: 12px; margin-left: 8px; }
main { max-width: 960px; margin: 24px auto; padding: 0 16px; }
form { display: grid; gap: 10px; grid-template-columns: 1fr 1fr; }
form label { display: flex; flex-direction: column; font-weight: 600; gap: 4px; }
form button { grid-column: span 2; padding: 12px; background: #4caf50; color: white; border: none; border-radius: 8px; font-size: 16px; cursor: pointer; }
.result-card { background: #1e1e1e; color: #eaeaea; padding: 20px; border-radius: 12px; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.5); line-height: 1.6; border: 1px solid #333; margin-top: 20px; }
.notice { padding: 12px 16px; border-radius: 8px; margin: 12px 0; }
.success { background: #e8f5e9; color: #1b5e20; }
.info { background: #e3f2fd; color: #0d47a1; }
.error { background: #ffebee; color: #b71c1c; }
.itinerary li { margin-bottom: 6px; }
.footer { text-align: center; font-size: 12px; color: #888; margin: 32px 0; }
"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, theme: Theme, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body data-theme="{theme}">
<div class="header"><h1>🌍 AI Travel Planner</h1><span class="badge">Pro</span></div>
<main>
{body}
</main>
<div class="footer">Travel Planner AI Pro | Data: Nominatim, Open-Meteo, exchangerate.host</div>
</body>
</html>"#,
        title = escape(title),
        theme = theme.as_str(),
    )
}

pub fn index_page() -> String {
    let body = r#"<h2>Plan your trip</h2>
<form method="post" action="/plan">
<label>Destination<input name="destination" placeholder="e.g., Paris" required></label>
<label>Days<input name="days" type="number" min="1" value="3" required></label>
<label>Travelers<input name="travelers" placeholder="e.g., 2 adults" required></label>
<label>Interests<input name="interests" placeholder="e.g., museums, food"></label>
<label>Budget<input name="budget" placeholder="e.g., mid-range"></label>
<button type="submit">Plan my trip</button>
</form>
<p><a href="/dashboard">Open the planning dashboard</a></p>"#;
    layout("Travel Planner", Theme::Light, body)
}

pub fn itinerary_page(request: &TripRequest, itinerary: &[String]) -> String {
    let mut items = String::new();
    for line in itinerary {
        let _ = writeln!(items, "<li>{line}</li>");
    }
    let body = format!(
        r#"<h2>Your trip to {destination}</h2>
<div class="notice info">
<p><strong>Days:</strong> {days} &middot; <strong>Travelers:</strong> {travelers}</p>
<p><strong>Interests:</strong> {interests} &middot; <strong>Budget:</strong> {budget}</p>
</div>
<ul class="itinerary">
{items}</ul>
<p><a href="/">Plan another trip</a></p>"#,
        destination = escape(&request.destination),
        days = request.days,
        travelers = escape(&request.travelers),
        interests = escape(&request.interests),
        budget = escape(&request.budget),
    );
    layout(&format!("Trip to {}", request.destination), Theme::Light, &body)
}

fn options<'a, I>(values: I, selected: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for (value, label) in values {
        let marker = if value == selected { " selected" } else { "" };
        let _ = write!(out, r#"<option value="{value}"{marker}>{label}</option>"#);
    }
    out
}

fn dashboard_form(request: &DashboardRequest) -> String {
    let seasons = options(
        Season::ALL.iter().map(|s| (s.as_str(), s.as_str())),
        request.season.as_str(),
    );
    let currencies = options(BUDGET_CURRENCIES.iter().map(|c| (*c, *c)), &request.budget_currency);
    let languages = options(
        std::iter::once(("None", "None")).chain(TRANSLATION_TARGETS.iter().map(|l| (*l, *l))),
        request.translate_to.as_deref().unwrap_or("None"),
    );
    let themes = options([("Light", "Light"), ("Dark", "Dark")], match request.theme {
        Theme::Light => "Light",
        Theme::Dark => "Dark",
    });
    format!(
        r#"<form method="post" action="/dashboard">
<label>Primary destination<input name="city" value="{city}" placeholder="e.g., Tokyo"></label>
<label>Additional destinations (comma separated)<input name="additional_cities" value="{additional}" placeholder="e.g., Kyoto, Osaka"></label>
<label>Trip duration (days)<input name="duration" type="number" min="1" max="30" value="{duration}"></label>
<label>Season<select name="season">{seasons}</select></label>
<label>Your nationality<input name="nationality" value="{nationality}"></label>
<label>Total budget<input name="budget" type="number" min="100" step="100" value="{budget}"></label>
<label>Budget currency<select name="budget_currency">{currencies}</select></label>
<label>Translate output to<select name="translate_to">{languages}</select></label>
<label>Theme<select name="theme">{themes}</select></label>
<button type="submit">🚀 Generate My Travel Plan</button>
</form>"#,
        city = escape(&request.city),
        additional = escape(&request.additional_cities),
        duration = request.duration,
        nationality = escape(&request.nationality),
        budget = request.budget,
    )
}

pub fn dashboard_page(request: &DashboardRequest, result: Option<(&DashboardPlan, &str)>) -> String {
    let mut body = String::from("<h2>✈️ Travel Planner AI Pro</h2>\n");
    body.push_str(&dashboard_form(request));

    if let Some((plan, download_url)) = result {
        let _ = write!(
            body,
            r#"
<div class="notice success">✅ Plan generated in {elapsed:.1} seconds!</div>
<div class="result-card">
{answer}
</div>
<p><a href="{download_url}" download="{file_name}">📥 Download Travel Plan as TXT</a></p>
<div class="notice info">📊 Used {tool_calls} tools across {steps} steps.</div>"#,
            elapsed = plan.elapsed.as_secs_f64(),
            answer = plan.answer,
            download_url = escape(download_url),
            file_name = escape(&plan.file_name),
            tool_calls = plan.tool_calls,
            steps = plan.steps,
        );
        if plan.truncated {
            body.push_str(
                "\n<div class=\"notice error\">⚠️ Planning hit the tool round limit; this plan may be incomplete.</div>",
            );
        }
    }
    layout("Travel Planner AI Pro", request.theme, &body)
}

pub fn error_page(status: u16, message: &str) -> String {
    let body = format!(
        r#"<div class="notice error"><strong>{status}</strong> {message}</div>
<p><a href="/">Back to the planner</a> &middot; <a href="/dashboard">Dashboard</a></p>"#,
        message = escape(message),
    );
    layout("Travel Planner", Theme::Light, &body)
}
