//! Effects - side effects declared by the reducer

use tracing::{info, warn};

use crate::action::Action;
use crate::api::PokemonSource;
use crate::sprite::decode_sprite;

/// Side effects that can be triggered by actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Fetch one page of the collection
    FetchPage { request: u64, offset: u32, limit: u32 },
    /// Resolve a card's detail through its list reference
    ResolveCard { mount: u64, reference: String },
    /// Fetch the record shown on the detail screen
    FetchDetail { id: u32 },
    /// Download and decode a sprite image
    FetchSprite { url: String },
}

impl Effect {
    /// Task slot the effect runs in. A newer page request replaces an older
    /// one; every card mount gets its own slot.
    pub fn task_key(&self) -> String {
        match self {
            Effect::FetchPage { .. } => "list_page".to_string(),
            Effect::ResolveCard { mount, .. } => format!("card_{mount}"),
            Effect::FetchDetail { .. } => "detail".to_string(),
            Effect::FetchSprite { url } => format!("sprite_{url}"),
        }
    }
}

/// Execute an effect against the source and turn the outcome into an action.
pub async fn run(effect: Effect, source: &dyn PokemonSource) -> Action {
    match effect {
        Effect::FetchPage {
            request,
            offset,
            limit,
        } => match source.fetch_page(offset, limit).await {
            Ok(page) => {
                info!(offset, received = page.items.len(), "page loaded");
                Action::ListDidLoad { request, page }
            }
            Err(err) => Action::ListDidError {
                request,
                error: err.to_string(),
            },
        },
        Effect::ResolveCard { mount, reference } => {
            match source.fetch_detail_by_reference(&reference).await {
                Ok(detail) => Action::CardDidLoad { mount, detail },
                Err(err) => Action::CardDidError {
                    mount,
                    error: err.to_string(),
                },
            }
        }
        Effect::FetchDetail { id } => match source.fetch_detail_by_id(id).await {
            Ok(detail) => Action::DetailDidLoad { id, detail },
            Err(err) => {
                warn!(id, error = %err, "detail screen fetch failed");
                Action::DetailDidError {
                    id,
                    error: err.to_string(),
                }
            }
        },
        Effect::FetchSprite { url } => match source.fetch_image(&url).await {
            Ok(bytes) => match decode_sprite(&bytes) {
                Ok(sprite) => Action::SpriteDidLoad { url, sprite },
                Err(err) => Action::SpriteDidError {
                    url,
                    error: err.to_string(),
                },
            },
            Err(err) => Action::SpriteDidError {
                url,
                error: err.to_string(),
            },
        },
    }
}
