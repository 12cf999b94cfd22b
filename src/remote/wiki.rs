//! MediaWiki page-image lookup.
//!
//! Search uses the `generator=search` + `prop=pageimages` query so one request
//! returns candidate pages together with their lead image. Only pages that
//! have an image are offered, ordered by the search rank in `index`.

use std::time::Duration;

use serde_json::Value;

use super::{ImageResolver, RemoteError, ResolvedImage};
use crate::cache::disk::{is_supported_extension, source_extension, FALLBACK_EXTENSION};
use crate::config::RemoteConfig;

/// Image source URL of a page object: `original.source`, else `thumbnail.source`.
fn page_image_source(page: &Value) -> Option<&str> {
    page.pointer("/original/source")
        .or_else(|| page.pointer("/thumbnail/source"))
        .and_then(Value::as_str)
        .filter(|source| !source.is_empty())
}

/// Titles of pages with an image, in search-rank order.
pub fn parse_search_response(response: &Value) -> Result<Vec<String>, RemoteError> {
    let Some(pages) = response.pointer("/query/pages") else {
        // MediaWiki omits `query` entirely when nothing matches.
        return Ok(Vec::new());
    };
    let pages = pages
        .as_object()
        .ok_or_else(|| RemoteError::Malformed("query.pages is not an object".to_string()))?;

    let mut ranked: Vec<(i64, &str)> = pages
        .values()
        .filter(|page| page_image_source(page).is_some())
        .filter_map(|page| {
            let title = page.get("title").and_then(Value::as_str)?;
            let index = page.get("index").and_then(Value::as_i64).unwrap_or(i64::MAX);
            (!title.is_empty()).then_some((index, title))
        })
        .collect();
    ranked.sort_by_key(|(index, _)| *index);

    Ok(ranked.into_iter().map(|(_, title)| title.to_string()).collect())
}

/// Page id and image URL of the first page in a title lookup.
pub fn parse_image_source(response: &Value, title: &str) -> Result<(String, String), RemoteError> {
    let (page_id, page) = response
        .pointer("/query/pages")
        .and_then(Value::as_object)
        .and_then(|pages| pages.iter().next())
        .ok_or_else(|| RemoteError::Malformed(format!("no page returned for '{title}'")))?;

    let source = page_image_source(page).ok_or_else(|| RemoteError::NoImage(title.to_string()))?;
    Ok((page_id.clone(), source.to_string()))
}

/// Extension to store a downloaded image under. GIF sources are refused.
pub fn image_extension(url: &str) -> Result<String, RemoteError> {
    let extension = source_extension(url);
    match extension.as_deref() {
        Some("gif") => Err(RemoteError::UnsupportedFormat {
            url: url.to_string(),
            extension: "gif".to_string(),
        }),
        Some(ext) if is_supported_extension(ext) => Ok(ext.to_string()),
        _ => Ok(FALLBACK_EXTENSION.to_string()),
    }
}

/// Blocking client for a MediaWiki `api.php` endpoint.
#[derive(Debug, Clone)]
pub struct WikiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    search_limit: u32,
}

impl WikiClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.wiki_endpoint.clone(),
            search_limit: config.search_limit,
        })
    }

    fn get_json(&self, params: &[(&str, &str)]) -> Result<Value, RemoteError> {
        let response = self.http.get(&self.endpoint).query(params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }
        response
            .json::<Value>()
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(RemoteError::EmptyBody(url.to_string()));
        }
        Ok(bytes.to_vec())
    }
}

impl ImageResolver for WikiClient {
    fn search_titles(&self, query: &str) -> Result<Vec<String>, RemoteError> {
        let limit = self.search_limit.to_string();
        let response = self.get_json(&[
            ("action", "query"),
            ("generator", "search"),
            ("gsrsearch", query),
            ("gsrlimit", &limit),
            ("prop", "pageimages"),
            ("piprop", "original"),
            ("format", "json"),
            ("gsrnamespace", "0"),
        ])?;
        let titles = parse_search_response(&response)?;
        log::debug!("Search '{}' returned {} titles with images", query, titles.len());
        Ok(titles)
    }

    fn resolve_image(&self, title: &str) -> Result<ResolvedImage, RemoteError> {
        let response = self.get_json(&[
            ("action", "query"),
            ("prop", "pageimages"),
            ("piprop", "original"),
            ("format", "json"),
            ("redirects", "1"),
            ("titles", title),
        ])?;
        let (page_id, source_url) = parse_image_source(&response, title)?;
        let extension = image_extension(&source_url)?;
        let bytes = self.download(&source_url)?;
        log::debug!("Downloaded {} bytes for '{}' from {}", bytes.len(), title, source_url);

        Ok(ResolvedImage {
            title: title.to_string(),
            page_id,
            source_url,
            extension,
            bytes,
        })
    }
}
