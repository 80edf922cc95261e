//! PokeAPI client

use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::config::{ApiConfig, DEFAULT_PAGE_LIMIT};
use crate::state::{
    ListItem, Page, PageCursor, PokemonAbility, PokemonDetail, PokemonStat, PokemonType,
};

// ============================================================================
// Wire format
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    count: Option<u32>,
    next: Option<String>,
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    height: u32,
    weight: u32,
    types: Vec<PokemonTypeSlot>,
    abilities: Vec<PokemonAbilitySlot>,
    stats: Vec<PokemonStatSlot>,
    #[serde(default)]
    sprites: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonTypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonAbilitySlot {
    ability: NamedResource,
    #[serde(default)]
    is_hidden: bool,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonStatSlot {
    base_stat: u16,
    stat: NamedResource,
}

impl From<PokemonResponse> for PokemonDetail {
    fn from(response: PokemonResponse) -> Self {
        let image_url = pointer_string(&response.sprites, "/front_default");
        PokemonDetail {
            id: response.id,
            name: response.name,
            height: response.height,
            weight: response.weight,
            types: response
                .types
                .into_iter()
                .map(|slot| PokemonType {
                    name: slot.type_info.name,
                })
                .collect(),
            abilities: response
                .abilities
                .into_iter()
                .map(|slot| PokemonAbility {
                    name: slot.ability.name,
                    is_hidden: slot.is_hidden,
                })
                .collect(),
            stats: response
                .stats
                .into_iter()
                .map(|slot| PokemonStat {
                    name: slot.stat.name,
                    base_value: slot.base_stat,
                })
                .collect(),
            image_url,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Any failure talking to the API: transport, timeout, non-2xx status or a
/// payload that does not decode.
#[derive(thiserror::Error, Debug)]
#[error("request to {url} failed: {source}")]
pub struct RemoteError {
    url: String,
    #[source]
    source: BoxError,
}

impl RemoteError {
    pub fn new(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

// ============================================================================
// Client
// ============================================================================

/// Read-only access to the Pokemon collection.
#[async_trait]
pub trait PokemonSource: Send + Sync {
    /// One page of list items starting at `offset`.
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page, RemoteError>;

    /// Detail behind a list item's reference, absolute or relative to the base.
    async fn fetch_detail_by_reference(&self, reference: &str)
        -> Result<PokemonDetail, RemoteError>;

    async fn fetch_detail_by_id(&self, id: u32) -> Result<PokemonDetail, RemoteError>;

    /// Raw bytes behind a sprite URL.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, RemoteError>;
}

/// HTTP implementation over reqwest. No retries, no caching.
#[derive(Clone, Debug)]
pub struct PokeApiClient {
    http: reqwest::Client,
    base: String,
}

impl PokeApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| RemoteError::new(config.base_address.clone(), err))?;
        Ok(Self {
            http,
            base: config.trimmed_base().to_string(),
        })
    }

    pub fn base_address(&self) -> &str {
        &self.base
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, RemoteError> {
        debug!(%url, "GET");
        // The error already carries the URL; keep reqwest from repeating it
        let fail = |err: reqwest::Error| RemoteError::new(url.as_str(), err.without_url());
        let response = self.http.get(url.clone()).send().await.map_err(fail)?;
        let response = response.error_for_status().map_err(fail)?;
        let bytes = response.bytes().await.map_err(fail)?;
        Ok(bytes.to_vec())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let bytes = self.get_bytes(url.clone()).await?;
        serde_json::from_slice(&bytes).map_err(|err| RemoteError::new(url.as_str(), err))
    }
}

#[async_trait]
impl PokemonSource for PokeApiClient {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page, RemoteError> {
        let url = page_url(&self.base, offset, limit)?;
        let response: ListResponse = self.get_json(url).await?;
        let mut items: Vec<ListItem> = response
            .results
            .into_iter()
            .map(|entry| ListItem {
                name: entry.name,
                url: entry.url,
            })
            .collect();
        if items.len() > limit as usize {
            debug!(received = items.len(), limit, "dropping items past page limit");
            items.truncate(limit as usize);
        }
        Ok(Page {
            items,
            next_cursor: response.next,
            total: response.count,
        })
    }

    async fn fetch_detail_by_reference(
        &self,
        reference: &str,
    ) -> Result<PokemonDetail, RemoteError> {
        let url = resolve_reference(&self.base, reference)?;
        let response: PokemonResponse = self.get_json(url).await?;
        Ok(response.into())
    }

    async fn fetch_detail_by_id(&self, id: u32) -> Result<PokemonDetail, RemoteError> {
        let url = parse_url(&format!("{}/{id}", self.base))?;
        let response: PokemonResponse = self.get_json(url).await?;
        Ok(response.into())
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let url = resolve_reference(&self.base, url)?;
        self.get_bytes(url).await
    }
}

// ============================================================================
// URL helpers
// ============================================================================

/// Collection query for one page.
pub fn page_url(base: &str, offset: u32, limit: u32) -> Result<Url, RemoteError> {
    let mut url = parse_url(&format!("{}/", base.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("offset", &offset.to_string())
        .append_pair("limit", &limit.to_string());
    Ok(url)
}

/// Absolute http(s) references are used as-is; anything else is appended
/// to the base address.
pub fn resolve_reference(base: &str, reference: &str) -> Result<Url, RemoteError> {
    if let Ok(url) = Url::parse(reference) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url);
        }
    }
    parse_url(&format!(
        "{}/{}",
        base.trim_end_matches('/'),
        reference.trim_start_matches('/')
    ))
}

/// Offset and limit carried by a next-page URL. Missing parameters fall back
/// to the first page and the default limit; anything unparseable is `None`.
pub fn parse_cursor(cursor: &str) -> Option<PageCursor> {
    let url = Url::parse(cursor).ok()?;
    let mut offset = None;
    let mut limit = None;
    for (key, value) in url.query_pairs() {
        match &*key {
            "offset" => offset = Some(value.parse::<u32>().ok()?),
            "limit" => limit = Some(value.parse::<u32>().ok()?),
            _ => {}
        }
    }
    Some(PageCursor {
        offset: offset.unwrap_or(0),
        limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1),
    })
}

fn parse_url(raw: &str) -> Result<Url, RemoteError> {
    Url::parse(raw).map_err(|err| RemoteError::new(raw, err))
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}
