//! Website fetcher: breadth-first, same-host crawl that keeps only visible page text.

use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Node, Selector};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_MAX_PAGES: usize = 10;
pub const MAX_PAGES_LIMIT: usize = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("chatfolio/", env!("CARGO_PKG_VERSION"));

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "svg", "template", "head"];
const BINARY_EXTENSIONS: &[&str] = &[
    ".pdf", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".zip", ".mp4", ".mp3",
    ".css", ".js", ".xml", ".docx",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL '{0}' (expected an absolute http(s) URL)")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{0} is not an HTML page")]
    NotHtml(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Everything pulled out of one HTML document.
#[derive(Debug, Default)]
struct ParsedPage {
    title: Option<String>,
    text: String,
    links: Vec<Url>,
}

#[derive(Clone)]
pub struct SiteCrawler {
    client: Client,
}

impl SiteCrawler {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .build()?,
        })
    }

    /// Crawls `start_url` breadth-first, staying on its host, until `max_pages` pages are fetched.
    ///
    /// Failures on later pages are logged and skipped. Only an invalid start URL or a
    /// failure on the first page is returned as an error.
    pub async fn crawl(
        &self,
        start_url: &str,
        max_pages: usize,
    ) -> Result<Vec<FetchedPage>, FetchError> {
        let start = parse_start_url(start_url)?;
        let max_pages = max_pages.clamp(1, MAX_PAGES_LIMIT);
        let host = start.host_str().unwrap_or_default().to_string();

        let mut queue = VecDeque::from([start.clone()]);
        let mut seen: HashSet<String> = HashSet::from([start.to_string()]);
        let mut pages = Vec::new();

        info!("Crawling {start} (max {max_pages} pages)");

        while let Some(url) = queue.pop_front() {
            if pages.len() >= max_pages {
                break;
            }

            let html = match self.fetch_html(&url).await {
                Ok(html) => html,
                Err(e) if url == start => return Err(e),
                Err(e) => {
                    warn!("Skipping {url}: {e}");
                    continue;
                }
            };

            let parsed = parse_page(&html, &url);
            for link in parsed.links {
                if link.host_str() == Some(host.as_str()) && seen.insert(link.to_string()) {
                    queue.push_back(link);
                }
            }

            if parsed.text.is_empty() {
                debug!("No visible text on {url}");
                continue;
            }

            pages.push(FetchedPage {
                url: url.to_string(),
                title: parsed.title,
                text: parsed.text,
            });
        }

        info!("Crawl of {start} finished: {} pages", pages.len());
        Ok(pages)
    }

    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);
        if !is_html {
            return Err(FetchError::NotHtml(url.to_string()));
        }

        Ok(response.text().await?)
    }
}

fn parse_start_url(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let mut url = Url::parse(&candidate).map_err(|_| FetchError::InvalidUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(FetchError::InvalidUrl(raw.to_string()));
    }
    url.set_fragment(None);
    Ok(url)
}

/// Resolves an `href` against the page URL; `None` for links the crawler never follows.
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || ["mailto:", "tel:", "javascript:", "data:"]
            .iter()
            .any(|p| lower.starts_with(p))
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);

    let path = url.path().to_ascii_lowercase();
    if BINARY_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return None;
    }
    Some(url)
}

fn selector(cell: &'static OnceLock<Option<Selector>>, css: &str) -> Option<&'static Selector> {
    cell.get_or_init(|| Selector::parse(css).ok()).as_ref()
}

fn parse_page(html: &str, base: &Url) -> ParsedPage {
    static TITLE: OnceLock<Option<Selector>> = OnceLock::new();
    static BODY: OnceLock<Option<Selector>> = OnceLock::new();
    static LINKS: OnceLock<Option<Selector>> = OnceLock::new();

    let doc = Html::parse_document(html);

    let title = selector(&TITLE, "title")
        .and_then(|sel| doc.select(sel).next())
        .map(|t| collapse(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    // The title leads the visible text so it is indexed with the body.
    let mut words: Vec<&str> = title
        .as_deref()
        .map(|t| t.split(' ').collect())
        .unwrap_or_default();
    if let Some(body) = selector(&BODY, "body").and_then(|sel| doc.select(sel).next()) {
        for node in body.descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|el| SKIPPED_TAGS.contains(&el.name()))
                    .unwrap_or(false)
            });
            if !hidden {
                words.extend(text.split_whitespace());
            }
        }
    }

    let links = selector(&LINKS, "a[href]")
        .map(|sel| {
            doc.select(sel)
                .filter_map(|a| a.value().attr("href"))
                .filter_map(|href| resolve_link(base, href))
                .collect()
        })
        .unwrap_or_default();

    let text = words.join(" ");
    ParsedPage { title, text, links }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
