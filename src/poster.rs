use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::PosterConfig;

/// TMDb movie search response (partial: we only need `results`).
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    poster_path: Option<String>,
}

/// Something that can find a poster image URL for a title.
pub trait PosterLookup {
    /// Best match's poster URL, or `None` when nothing was found.
    fn lookup(&self, title: &str, year: Option<i32>) -> Result<Option<String>>;
}

/// Lookup that never finds anything. Used when posters are disabled.
pub struct NoPosters;

impl PosterLookup for NoPosters {
    fn lookup(&self, _title: &str, _year: Option<i32>) -> Result<Option<String>> {
        Ok(None)
    }
}

/// TMDb `search/movie` client.
pub struct TmdbClient {
    agent: ureq::Agent,
    api_key: String,
    api_url: String,
    image_base_url: String,
}

impl TmdbClient {
    /// Build a client, or `None` if lookups are disabled or no API key is set.
    pub fn from_config(config: &PosterConfig) -> Option<Self> {
        if !config.enabled {
            log::debug!("Poster lookup disabled in config");
            return None;
        }
        let Some(api_key) = config.resolve_api_key() else {
            log::info!(
                "No TMDb API key (set posters.api_key or {}), posters will be left blank",
                crate::config::TMDB_KEY_ENV
            );
            return None;
        };
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();
        Some(Self {
            agent,
            api_key,
            api_url: config.api_url.clone(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn poster_url(&self, response: SearchResponse) -> Option<String> {
        let path = response.results.into_iter().next()?.poster_path?;
        if path.is_empty() {
            return None;
        }
        Some(format!("{}{path}", self.image_base_url))
    }
}

impl PosterLookup for TmdbClient {
    fn lookup(&self, title: &str, year: Option<i32>) -> Result<Option<String>> {
        log::debug!("Searching TMDb for \"{title}\" ({year:?})");
        let mut request = self
            .agent
            .get(&self.api_url)
            .query("api_key", &self.api_key)
            .query("query", title);
        if let Some(year) = year {
            request = request.query("year", year.to_string());
        }

        let response: SearchResponse = request
            .call()
            .with_context(|| format!("HTTP request failed for \"{title}\""))?
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse JSON for \"{title}\""))?;

        Ok(self.poster_url(response))
    }
}

/// Look up a poster, swallowing failures. A blank title skips the lookup.
/// Returns an empty string when there is no poster.
pub fn fetch_poster(lookup: &dyn PosterLookup, title: &str, year: Option<i32>) -> String {
    let title = title.trim();
    if title.is_empty() {
        return String::new();
    }
    match lookup.lookup(title, year) {
        Ok(Some(url)) => url,
        Ok(None) => {
            log::debug!("No poster found for \"{title}\"");
            String::new()
        }
        Err(e) => {
            log::warn!("Poster lookup failed for \"{title}\": {e:#}");
            String::new()
        }
    }
}
