//! Network tools: `web_search`, `scrape_url` and `get_weather`.
//!
//! Tools run on the blocking pool, so they use reqwest's blocking client.
//! Response parsing is kept in plain functions that work on text.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::run_command::cap_output;
use super::{parse_args, Tool, ToolError};

use crate::constants::{
    SEARCH_DEFAULT_RESULTS, SEARCH_URL, WEATHER_TIMEOUT, WEATHER_URL, WEB_TIMEOUT, WEB_USER_AGENT,
};

/// Elements whose text never counts as page content.
const SKIPPED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside", "noscript"];

fn client(timeout: std::time::Duration, kind: &str) -> Result<Client, ToolError> {
    Client::builder()
        .user_agent(WEB_USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| ToolError::new(kind, format!("Failed to build HTTP client: {}", e)))
}

fn selector(css: &str, kind: &str) -> Result<Selector, ToolError> {
    Selector::parse(css).map_err(|e| ToolError::new(kind, e.to_string()))
}

// --- web_search ---

pub struct WebSearchTool;

#[derive(Deserialize)]
struct WebSearchInput {
    query: String,
    #[serde(default = "default_engine")]
    engine: String,
    #[serde(default = "default_safesearch")]
    safesearch: String,
    #[serde(default = "default_region")]
    region: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_engine() -> String {
    "duckduckgo".to_string()
}

fn default_safesearch() -> String {
    "moderate".to_string()
}

fn default_region() -> String {
    "wt-wt".to_string()
}

fn default_max_results() -> usize {
    SEARCH_DEFAULT_RESULTS
}

/// One hit from a results page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// DuckDuckGo's `kp` value for a safesearch level.
fn safesearch_param(level: &str) -> Result<&'static str, ToolError> {
    match level.to_lowercase().as_str() {
        "strict" => Ok("1"),
        "moderate" => Ok("-1"),
        "off" => Ok("-2"),
        other => Err(ToolError::invalid_arguments(format!(
            "safesearch must be off, moderate or strict, got '{}'",
            other
        ))),
    }
}

/// Unwraps DuckDuckGo's `/l/?uddg=<target>` redirect links.
fn result_target(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

/// Extracts up to `limit` results from a DuckDuckGo HTML results page.
pub fn parse_search_results(html: &str, limit: usize) -> Result<Vec<SearchResult>, ToolError> {
    let document = Html::parse_document(html);
    let result = selector("div.result", "SearchError")?;
    let link = selector("a.result__a", "SearchError")?;
    let snippet = selector(".result__snippet", "SearchError")?;

    let mut results = Vec::new();
    for node in document.select(&result) {
        if results.len() >= limit {
            break;
        }
        let Some(anchor) = node.select(&link).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let body = node
            .select(&snippet)
            .next()
            .map(|s| s.text().collect::<String>())
            .unwrap_or_default();
        results.push(SearchResult {
            title: anchor.text().collect::<String>().trim().to_string(),
            href: result_target(href),
            body: body.trim().to_string(),
        });
    }
    Ok(results)
}

impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and return a list of results with title, href and body.\n\
         Use it for current events or anything you do not know. Search operators \
         such as site: and filetype: narrow the results."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The search query" },
                "engine": { "type": "string", "description": "Search engine (duckduckgo)" },
                "safesearch": { "type": "string", "enum": ["off", "moderate", "strict"] },
                "region": { "type": "string", "description": "Region code, e.g. 'us-en' (default 'wt-wt')" },
                "max_results": { "type": "integer", "description": "Maximum results (default 5)" }
            },
            "required": ["query"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: WebSearchInput = parse_args(params)?;
        if !input.engine.eq_ignore_ascii_case("duckduckgo") {
            return Err(ToolError::invalid_arguments(format!(
                "unsupported search engine '{}'",
                input.engine
            )));
        }
        let kp = safesearch_param(&input.safesearch)?;
        let url = Url::parse_with_params(
            SEARCH_URL,
            &[
                ("q", input.query.as_str()),
                ("kl", input.region.as_str()),
                ("kp", kp),
            ],
        )
        .map_err(|e| ToolError::new("SearchError", e.to_string()))?;

        tracing::debug!(query = %input.query, "web search");
        let html = client(WEB_TIMEOUT, "SearchError")?
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| ToolError::new("SearchError", format!("Search request failed: {}", e)))?;

        let results = parse_search_results(&html, input.max_results)?;
        serde_json::to_value(results).map_err(|e| ToolError::new("SearchError", e.to_string()))
    }
}

// --- scrape_url ---

pub struct ScrapeUrlTool;

#[derive(Deserialize)]
struct ScrapeUrlInput {
    url: String,
}

/// Title plus the readable text of the page's main element.
pub fn page_text(html: &str) -> Result<String, ToolError> {
    let document = Html::parse_document(html);
    let title = document
        .select(&selector("title", "ScrapeError")?)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No title found.".to_string());

    let mut main = None;
    for tag in ["article", "main", "body"] {
        main = document.select(&selector(tag, "ScrapeError")?).next();
        if main.is_some() {
            break;
        }
    }

    let mut lines = Vec::new();
    if let Some(main) = main {
        for node in main.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| SKIPPED_TAGS.contains(&e.name()))
            });
            let text = text.trim();
            if !hidden && !text.is_empty() {
                lines.push(text);
            }
        }
    }
    Ok(format!("Title: {}\n\nContent:\n{}", title, lines.join("\n")))
}

impl Tool for ScrapeUrlTool {
    fn name(&self) -> &str {
        "scrape_url"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its title and main text.\n\
         Only use URLs given by the user or returned by web_search."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Full URL, e.g. https://example.com/article" }
            },
            "required": ["url"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: ScrapeUrlInput = parse_args(params)?;
        let url = Url::parse(&input.url).map_err(ToolError::invalid_arguments)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ToolError::invalid_arguments(format!(
                "only http and https URLs can be scraped, got '{}'",
                url.scheme()
            )));
        }

        tracing::debug!(url = %url, "scraping page");
        let response = client(WEB_TIMEOUT, "ScrapeError")?
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ToolError::new("ScrapeError", format!("Could not retrieve URL: {}", e)))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("text/html") {
            return Err(ToolError::new(
                "ScrapeError",
                format!("Content type is not text/html, but '{}'.", content_type),
            ));
        }

        let html = response
            .text()
            .map_err(|e| ToolError::new("ScrapeError", format!("Could not read page: {}", e)))?;
        Ok(Value::String(cap_output(&page_text(&html)?)))
    }
}

// --- get_weather ---

pub struct WeatherTool;

#[derive(Deserialize)]
struct WeatherInput {
    location: String,
}

/// Condenses a wttr.in `format=j1` payload to the current conditions.
pub fn current_conditions(payload: &Value) -> Result<Value, ToolError> {
    let missing = || ToolError::new("WeatherError", "Unexpected weather data format");
    let current = payload["current_condition"].get(0).ok_or_else(missing)?;
    let number = |key: &str| -> Result<i64, ToolError> {
        current[key]
            .as_str()
            .and_then(|v| v.trim().parse().ok())
            .or_else(|| current[key].as_i64())
            .ok_or_else(missing)
    };
    let condition = current["weatherDesc"][0]["value"]
        .as_str()
        .ok_or_else(missing)?;

    Ok(json!({
        "units": "metric",
        "condition": condition.trim(),
        "temperature": number("temp_C")?,
        "feels_like": number("FeelsLikeC")?,
        "wind_speed": number("windspeedKmph")?,
    }))
}

impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a location (city, zip code, airport code or landmark)."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": { "type": "string", "description": "Where to get the weather for, e.g. 'Paris'" }
            },
            "required": ["location"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: WeatherInput = parse_args(params)?;
        let fetch_error = |detail: String| {
            ToolError::new(
                "WeatherError",
                format!("Could not fetch weather data for '{}': {}", input.location, detail),
            )
        };

        let mut url = Url::parse(WEATHER_URL).map_err(|e| fetch_error(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| fetch_error("invalid service URL".to_string()))?
            .pop_if_empty()
            .push(&input.location);
        url.query_pairs_mut().append_pair("format", "j1");

        tracing::debug!(location = %input.location, "fetching weather");
        let payload: Value = client(WEATHER_TIMEOUT, "WeatherError")?
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| fetch_error(e.to_string()))?;
        current_conditions(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r##"
<html><body>
  <div class="result results_links">
    <h2 class="result__title">
      <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust Programming Language</a>
    </h2>
    <a class="result__snippet" href="#">A language empowering everyone to build <b>reliable</b> software.</a>
  </div>
  <div class="result results_links">
    <a class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a>
    <div class="result__snippet">Learn Rust.</div>
  </div>
  <div class="result result--ad">
    <span>No link here</span>
  </div>
  <div class="result">
    <a class="result__a" href="https://crates.io/">crates.io</a>
  </div>
</body></html>
"##;

    #[test]
    fn test_parse_search_results() {
        let results = parse_search_results(RESULTS_PAGE, 5).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0],
            SearchResult {
                title: "Rust Programming Language".into(),
                href: "https://www.rust-lang.org/".into(),
                body: "A language empowering everyone to build reliable software.".into(),
            }
        );
        assert_eq!(results[1].href, "https://doc.rust-lang.org/book/");
        assert_eq!(results[2].body, "");

        assert_eq!(parse_search_results(RESULTS_PAGE, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_search_rejects_bad_options() {
        let err = WebSearchTool
            .execute(json!({"query": "rust", "engine": "altavista"}))
            .unwrap_err();
        assert_eq!(err.name, "InvalidArguments");
        let err = WebSearchTool
            .execute(json!({"query": "rust", "safesearch": "maybe"}))
            .unwrap_err();
        assert_eq!(err.name, "InvalidArguments");
        assert_eq!(safesearch_param("Strict").unwrap(), "1");
    }

    #[test]
    fn test_page_text_skips_chrome() {
        let html = r#"
<html><head><title> Release notes </title><style>body { color: red }</style></head>
<body>
  <nav>Home | Blog</nav>
  <article>
    <h1>Version 2.0</h1>
    <script>track();</script>
    <p>Faster builds.</p>
    <aside>Related posts</aside>
  </article>
  <footer>Copyright</footer>
</body></html>
"#;
        assert_eq!(
            page_text(html).unwrap(),
            "Title: Release notes\n\nContent:\nVersion 2.0\nFaster builds."
        );
        assert!(page_text("<p>bare</p>")
            .unwrap()
            .starts_with("Title: No title found.\n\nContent:\nbare"));
    }

    #[test]
    fn test_scrape_rejects_non_http() {
        let err = ScrapeUrlTool
            .execute(json!({"url": "file:///etc/passwd"}))
            .unwrap_err();
        assert_eq!(err.name, "InvalidArguments");
        let err = ScrapeUrlTool.execute(json!({"url": "not a url"})).unwrap_err();
        assert_eq!(err.name, "InvalidArguments");
    }

    #[test]
    fn test_current_conditions() {
        let payload = json!({
            "current_condition": [{
                "FeelsLikeC": "11",
                "temp_C": "13",
                "weatherDesc": [{"value": "Partly cloudy "}],
                "windspeedKmph": "9"
            }],
            "weather": []
        });
        assert_eq!(
            current_conditions(&payload).unwrap(),
            json!({
                "units": "metric",
                "condition": "Partly cloudy",
                "temperature": 13,
                "feels_like": 11,
                "wind_speed": 9
            })
        );

        let err = current_conditions(&json!({"current_condition": []})).unwrap_err();
        assert_eq!(err.name, "WeatherError");
    }
}
