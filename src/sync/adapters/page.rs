//! DOM-extraction helpers shared by the scraping adapters.
//!
//! Parsed documents never cross an await point: each helper takes the raw
//! body, parses, and returns owned values, so the non-`Send` parse tree
//! stays inside one call.

use scraper::{Html, Selector};

/// A login form located on a fetched page: where to submit and which field
/// names carry the credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// The form's `action` attribute, unresolved. `None` means the form posts
    /// back to the page it was served from.
    pub action: Option<String>,
    pub username_field: String,
    pub password_field: String,
}

/// Locates a login form by trying each username-input selector in order and
/// pairing it with the page's password input. Returns `None` when no
/// candidate selector matches anything on the page.
pub fn find_login_form(
    body: &str,
    username_selectors: &[&str],
    password_selectors: &[&str],
) -> Option<LoginForm> {
    let document = Html::parse_document(body);

    let username_input = first_match(&document, username_selectors)?;
    let username_field = username_input
        .value()
        .attr("name")
        .unwrap_or("username")
        .to_string();

    let password_input = first_match(&document, password_selectors)?;
    let password_field = password_input
        .value()
        .attr("name")
        .unwrap_or("password")
        .to_string();

    let form_selector = Selector::parse("form").expect("selector should parse");
    let action = document
        .select(&form_selector)
        .next()
        .and_then(|form| form.value().attr("action"))
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_owned);

    Some(LoginForm {
        action,
        username_field,
        password_field,
    })
}

/// Extracts a numeric metric from the first element matched by any of the
/// candidate selectors. Missing elements and non-numeric text both yield 0;
/// scraped dashboards degrade silently rather than failing the sync.
pub fn extract_metric(body: &str, selectors: &[&str]) -> f64 {
    let document = Html::parse_document(body);
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect();
            return parse_metric_text(&text);
        }
    }
    0.0
}

/// Parses dashboard metric text ("1,234", "$12.50", "€ 7") to a number.
pub fn parse_metric_text(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Resolves a form `action` against the page it was served from. A missing
/// action posts back to the same page.
pub fn resolve_action(page_url: &str, action: Option<&str>) -> Result<String, url::ParseError> {
    let base = url::Url::parse(page_url)?;
    match action {
        Some(action) => Ok(base.join(action)?.into()),
        None => Ok(base.into()),
    }
}

fn first_match<'a>(
    document: &'a Html,
    selectors: &[&str],
) -> Option<scraper::ElementRef<'a>> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            return Some(element);
        }
    }
    None
}
