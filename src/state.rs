//! Application state - single source of truth

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::config::DEFAULT_PAGE_LIMIT;
use crate::sprite::SpriteData;

/// Terminal widths above this get three grid columns instead of two.
pub const WIDE_LAYOUT_MIN_WIDTH: u16 = 100;

/// Interval between spinner frames while anything is loading.
pub const SPINNER_TICK_MS: u64 = 90;

/// Lightweight handle returned by the collection endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ListItem {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonType {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonAbility {
    pub name: String,
    pub is_hidden: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonStat {
    pub name: String,
    pub base_value: u16,
}

/// Fully resolved Pokemon record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    /// Decimetres
    pub height: u32,
    /// Hectograms
    pub weight: u32,
    pub types: Vec<PokemonType>,
    pub abilities: Vec<PokemonAbility>,
    pub stats: Vec<PokemonStat>,
    pub image_url: Option<String>,
}

impl PokemonDetail {
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }

    /// `#025` style dex number
    pub fn dex_number(&self) -> String {
        format!("#{:03}", self.id)
    }

    /// Height in metres, two decimals
    pub fn height_m(&self) -> String {
        tenths(self.height)
    }

    /// Weight in kilograms, two decimals
    pub fn weight_kg(&self) -> String {
        tenths(self.weight)
    }
}

/// One page of the collection, in server order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Page {
    pub items: Vec<ListItem>,
    /// Next-page URL; `None` once the collection is exhausted.
    pub next_cursor: Option<String>,
    /// Total collection size as reported by the API.
    pub total: Option<u32>,
}

/// Offset/limit pair parsed out of a next-page URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageCursor {
    pub offset: u32,
    pub limit: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ListPhase {
    #[default]
    Idle,
    InitialLoading,
    Ready,
    Refreshing,
    LoadingMore,
    Failed,
}

/// Paginated list owned by the list controller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ListState {
    /// Append-only across pagination, replaced on refresh.
    pub items: Vec<ListItem>,
    pub next_cursor: Option<String>,
    pub phase: ListPhase,
    /// Message of the last blocking failure (initial load or refresh).
    pub error: Option<String>,
    pub total: Option<u32>,
    /// Token of the latest page request; results for older tokens are stale.
    pub request: u64,
}

impl ListState {
    /// Whether the first page (or a refresh of it) is outstanding.
    pub fn is_blocking_load(&self) -> bool {
        matches!(
            self.phase,
            ListPhase::Idle | ListPhase::InitialLoading | ListPhase::Refreshing
        )
    }

    pub fn is_loading_more(&self) -> bool {
        self.phase == ListPhase::LoadingMore
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase == ListPhase::Ready && self.next_cursor.is_none()
    }
}

/// Per-item detail resolution, one mount at a time.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct CardState {
    pub mount: u64,
    pub detail: DataResource<PokemonDetail>,
}

impl CardState {
    pub fn mounted(mount: u64) -> Self {
        Self {
            mount,
            detail: DataResource::Loading,
        }
    }

    /// Only a card with a resolved detail accepts selection.
    pub fn resolved(&self) -> Option<&PokemonDetail> {
        self.detail.data()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Screen {
    #[default]
    List,
    Detail {
        id: u32,
    },
}

/// Application state - everything the UI needs to render
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    pub list: ListState,
    /// Same length and order as `list.items`.
    pub cards: Vec<CardState>,
    pub selected: usize,
    pub screen: Screen,
    /// Record shown on the detail screen.
    pub detail: DataResource<PokemonDetail>,
    /// Decoded sprites by image URL, kept for the whole session.
    pub sprites: HashMap<String, DataResource<SpriteData>>,
    pub page_limit: u32,
    pub next_mount: u64,
    pub tick: u64,
}

impl AppState {
    pub fn new(page_limit: u32) -> Self {
        Self {
            list: ListState::default(),
            cards: Vec::new(),
            selected: 0,
            screen: Screen::List,
            detail: DataResource::Empty,
            sprites: HashMap::new(),
            page_limit: page_limit.max(1),
            next_mount: 0,
            tick: 0,
        }
    }

    pub fn card(&self, index: usize) -> Option<(&ListItem, &CardState)> {
        Some((self.list.items.get(index)?, self.cards.get(index)?))
    }

    pub fn selected_card(&self) -> Option<(&ListItem, &CardState)> {
        self.card(self.selected)
    }

    /// Loaded sprite for a record, if any.
    pub fn sprite(&self, detail: &PokemonDetail) -> Option<&SpriteData> {
        let url = detail.image_url.as_ref()?;
        self.sprites.get(url)?.data()
    }

    /// Whether a spinner is visible somewhere.
    pub fn is_busy(&self) -> bool {
        self.list.is_blocking_load()
            || self.list.is_loading_more()
            || self.detail.is_loading()
            || self.cards.iter().any(|card| card.detail.is_loading())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let ready = self.cards.iter().filter(|c| c.detail.is_loaded()).count();
        let failed = self.cards.iter().filter(|c| c.detail.is_failed()).count();
        vec![
            DebugSection::new("List")
                .entry("phase", ron_string(&self.list.phase))
                .entry("items", ron_string(&self.list.items.len()))
                .entry("total", ron_string(&self.list.total))
                .entry("next", ron_string(&self.list.next_cursor))
                .entry("request", ron_string(&self.list.request))
                .entry("error", ron_string(&self.list.error)),
            DebugSection::new("Cards")
                .entry("ready", ron_string(&ready))
                .entry("failed", ron_string(&failed))
                .entry("selected", ron_string(&self.selected))
                .entry("next_mount", ron_string(&self.next_mount)),
            DebugSection::new("Sprites")
                .entry("cached", ron_string(&self.sprites.len()))
                .entry(
                    "loading",
                    ron_string(&self.sprites.values().filter(|s| s.is_loading()).count()),
                ),
            DebugSection::new("Screen")
                .entry("screen", ron_string(&self.screen))
                .entry("detail_loading", ron_string(&self.detail.is_loading())),
        ]
    }
}

/// Grid columns for a viewport width; recomputed on every render.
pub fn columns_for_width(width: u16) -> usize {
    if width > WIDE_LAYOUT_MIN_WIDTH {
        3
    } else {
        2
    }
}

/// Uppercase the first character, leave the rest as the API sent it.
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

/// Stat label: capitalized with its first hyphen turned into a space.
pub fn stat_label(name: &str) -> String {
    display_name(&name.replacen('-', " ", 1))
}

/// Fixed divide-by-ten transform used for height and weight.
pub fn tenths(value: u32) -> String {
    format!("{:.2}", f64::from(value) / 10.0)
}
