//! Scrapes the CSRF token the admin pages embed as `<div id="token">…</div>`.

use scraper::{Html, Selector};

/// Return the text content of the element whose `id` is `token`, with
/// newlines removed. Empty when no such element exists.
pub fn find_token(html: &str) -> String {
    let Ok(selector) = Selector::parse("#token") else {
        return String::new();
    };

    Html::parse_document(html)
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().replace(['\n', '\r'], ""))
        .unwrap_or_default()
}
