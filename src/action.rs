//! Actions: user intents and async results

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::sprite::SpriteData;
use crate::state::{Page, PokemonDetail};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    // ===== List controller =====
    /// Intent: load the first page (mount, or retry after a failure)
    ListFetch,

    /// Intent: drop everything and reload the first page
    ListRefresh,

    /// Intent: the user scrolled near the end; fetch the next page
    ListLoadMore,

    /// Result: page for the given request token
    ListDidLoad { request: u64, page: Page },

    /// Result: page request failed
    ListDidError { request: u64, error: String },

    // ===== Card resolvers =====
    CardDidLoad { mount: u64, detail: PokemonDetail },
    CardDidError { mount: u64, error: String },

    /// Remount a failed card
    CardRetry(usize),

    // ===== Sprites =====
    SpriteDidLoad { url: String, sprite: SpriteData },
    SpriteDidError { url: String, error: String },

    // ===== Grid =====
    GridSelect(usize),

    /// Open the selected card; ignored unless its detail is resolved
    GridOpen,

    // ===== Detail screen =====
    DetailDidLoad { id: u32, detail: PokemonDetail },
    DetailDidError { id: u32, error: String },
    DetailRetry,
    DetailClose,

    // ===== Global =====
    /// Spinner frame
    Tick,

    Quit,
}
