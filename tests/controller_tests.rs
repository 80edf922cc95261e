//! List controller and card resolver flows, end to end through the effect
//! runner against an in-memory source.

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tui_dispatch::NumericComponentId;
use tui_dispatch::testing::*;

use pokedex::{
    action::Action,
    api::{PokemonSource, RemoteError, parse_cursor},
    components::{Component, ListScreen, ListScreenProps},
    effect::{self, Effect},
    reducer::reducer,
    state::{AppState, ListItem, ListPhase, Page, PokemonDetail, PokemonType, Screen},
};

const BASE: &str = "https://pokeapi.test/api/v2/pokemon";

fn sprite_url(id: u32) -> String {
    format!("https://img.pokeapi.test/{id}.png")
}

fn sprite_png() -> Vec<u8> {
    let canvas = image::RgbaImage::from_pixel(6, 6, image::Rgba([200, 40, 40, 255]));
    let mut buf = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Serves a collection of `total` Pokemon, ids starting at 1.
struct MockSource {
    total: u32,
    page_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    image_calls: AtomicUsize,
    failing_ids: Mutex<HashSet<u32>>,
    broken_images: Mutex<HashSet<u32>>,
    sprites: AtomicBool,
    list_down: Mutex<bool>,
}

impl MockSource {
    fn new(total: u32) -> Self {
        Self {
            total,
            page_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            failing_ids: Mutex::new(HashSet::new()),
            broken_images: Mutex::new(HashSet::new()),
            sprites: AtomicBool::new(false),
            list_down: Mutex::new(false),
        }
    }

    fn fail_detail(&self, id: u32) {
        self.failing_ids.lock().unwrap().insert(id);
    }

    fn heal_detail(&self, id: u32) {
        self.failing_ids.lock().unwrap().remove(&id);
    }

    /// Records carry an image URL from now on.
    fn with_sprites(&self) {
        self.sprites.store(true, Ordering::SeqCst);
    }

    /// Serve bytes that do not decode for this id's image.
    fn break_image(&self, id: u32) {
        self.broken_images.lock().unwrap().insert(id);
    }

    fn set_list_down(&self, down: bool) {
        *self.list_down.lock().unwrap() = down;
    }

    fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    fn detail(&self, id: u32) -> Result<PokemonDetail, RemoteError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let url = format!("{BASE}/{id}");
        if self.failing_ids.lock().unwrap().contains(&id) || id == 0 || id > self.total {
            return Err(RemoteError::new(url, "404 Not Found"));
        }
        Ok(PokemonDetail {
            id,
            name: format!("mon-{id}"),
            height: 40,
            weight: 60,
            types: vec![PokemonType {
                name: "normal".into(),
            }],
            abilities: Vec::new(),
            stats: Vec::new(),
            image_url: self
                .sprites
                .load(Ordering::SeqCst)
                .then(|| sprite_url(id)),
        })
    }
}

#[async_trait]
impl PokemonSource for MockSource {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page, RemoteError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if *self.list_down.lock().unwrap() {
            return Err(RemoteError::new(BASE, "connection refused"));
        }
        let end = (offset + limit).min(self.total);
        let items = (offset..end)
            .map(|i| ListItem {
                name: format!("mon-{}", i + 1),
                url: format!("{BASE}/{}/", i + 1),
            })
            .collect();
        let next_cursor =
            (end < self.total).then(|| format!("{BASE}?offset={end}&limit={limit}"));
        Ok(Page {
            items,
            next_cursor,
            total: Some(self.total),
        })
    }

    async fn fetch_detail_by_reference(
        &self,
        reference: &str,
    ) -> Result<PokemonDetail, RemoteError> {
        let id = reference
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|seg| seg.parse().ok())
            .unwrap_or(0);
        self.detail(id)
    }

    async fn fetch_detail_by_id(&self, id: u32) -> Result<PokemonDetail, RemoteError> {
        self.detail(id)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let id: u32 = url
            .trim_end_matches(".png")
            .rsplit('/')
            .next()
            .and_then(|seg| seg.parse().ok())
            .unwrap_or(0);
        if self.broken_images.lock().unwrap().contains(&id) {
            return Ok(b"not an image".to_vec());
        }
        Ok(sprite_png())
    }
}

/// Run every pending effect against the source and feed the results back,
/// until nothing is left.
macro_rules! settle {
    ($harness:expr, $source:expr) => {
        loop {
            let effects = $harness.drain_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                let action = effect::run(effect, &$source).await;
                $harness.complete_action(action);
            }
            $harness.process_emitted();
        }
    };
}

fn offset_of_cursor(state: &AppState) -> Option<u32> {
    state
        .list
        .next_cursor
        .as_deref()
        .and_then(parse_cursor)
        .map(|cursor| cursor.offset)
}

#[tokio::test]
async fn test_initial_load_resolves_every_card() {
    let source = MockSource::new(100);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);

    harness.dispatch_collect(Action::ListFetch);
    harness.assert_state(|s| s.list.phase == ListPhase::InitialLoading);
    settle!(harness, source);

    harness.assert_state(|s| s.list.phase == ListPhase::Ready);
    harness.assert_state(|s| s.list.items.len() == 20);
    harness.assert_state(|s| s.cards.iter().all(|c| c.detail.is_loaded()));
    harness.assert_state(|s| offset_of_cursor(s) == Some(20));
    assert_eq!(source.page_calls(), 1);
    assert_eq!(source.detail_calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_load_more_appends_in_order() {
    let source = MockSource::new(100);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);

    harness.dispatch_collect(Action::ListLoadMore);
    settle!(harness, source);

    harness.assert_state(|s| s.list.items.len() == 40);
    harness.assert_state(|s| s.cards.len() == 40);
    harness.assert_state(|s| offset_of_cursor(s) == Some(40));
    harness.assert_state(|s| {
        s.list
            .items
            .iter()
            .map(|item| item.name.clone())
            .eq((1..=40).map(|i| format!("mon-{i}")))
    });
    assert_eq!(source.page_calls(), 2);
}

#[tokio::test]
async fn test_double_load_more_issues_one_fetch() {
    let source = MockSource::new(100);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);

    harness.dispatch_collect(Action::ListLoadMore);
    harness.dispatch_collect(Action::ListLoadMore);
    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| {
        matches!(
            e,
            Effect::FetchPage {
                offset: 20,
                limit: 20,
                ..
            }
        )
    });
}

#[tokio::test]
async fn test_exhausted_list_makes_no_more_calls() {
    let source = MockSource::new(25);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);
    harness.dispatch_collect(Action::ListLoadMore);
    settle!(harness, source);

    harness.assert_state(|s| s.list.items.len() == 25);
    harness.assert_state(|s| s.list.is_exhausted());

    harness.dispatch_collect(Action::ListLoadMore);
    harness.drain_effects().effects_empty();
    assert_eq!(source.page_calls(), 2);
}

#[tokio::test]
async fn test_failing_card_does_not_affect_list() {
    let source = MockSource::new(100);
    source.fail_detail(3);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);

    harness.assert_state(|s| s.cards[2].detail.is_failed());
    harness.assert_state(|s| s.cards.iter().filter(|c| c.detail.is_loaded()).count() == 19);
    harness.assert_state(|s| s.list.phase == ListPhase::Ready);

    // Card retry is independent of the list
    source.heal_detail(3);
    harness.dispatch_collect(Action::CardRetry(2));
    settle!(harness, source);
    harness.assert_state(|s| s.cards[2].detail.is_loaded());
    assert_eq!(source.page_calls(), 1);
}

#[tokio::test]
async fn test_refresh_replaces_list() {
    let source = MockSource::new(100);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);
    harness.dispatch_collect(Action::ListLoadMore);
    settle!(harness, source);
    harness.assert_state(|s| s.list.items.len() == 40);

    harness.dispatch_collect(Action::ListRefresh);
    harness.assert_state(|s| s.list.items.is_empty() && s.cards.is_empty());
    settle!(harness, source);

    harness.assert_state(|s| s.list.items.len() == 20);
    harness.assert_state(|s| offset_of_cursor(s) == Some(20));
}

#[tokio::test]
async fn test_initial_failure_then_retry() {
    let source = MockSource::new(100);
    source.set_list_down(true);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);

    harness.assert_state(|s| s.list.phase == ListPhase::Failed);
    harness.assert_state(|s| {
        s.list
            .error
            .as_deref()
            .is_some_and(|e| e.contains("connection refused"))
    });
    harness.assert_state(|s| s.list.items.is_empty());

    // The "r" key on the failed list retries
    let mut screen = ListScreen::new();
    let actions = harness.send_keys::<NumericComponentId, _, _>("r", |state, event| {
        screen
            .handle_event(
                &event.kind,
                ListScreenProps {
                    state,
                    is_focused: true,
                },
            )
            .into_iter()
            .collect::<Vec<_>>()
    });
    actions.assert_first(Action::ListFetch);

    source.set_list_down(false);
    for action in actions {
        harness.dispatch_collect(action);
    }
    settle!(harness, source);
    harness.assert_state(|s| s.list.phase == ListPhase::Ready);
    harness.assert_state(|s| s.list.items.len() == 20);
}

#[tokio::test]
async fn test_open_ready_card_loads_detail_screen() {
    let source = MockSource::new(100);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);

    harness.dispatch_collect(Action::GridSelect(4));
    harness.dispatch_collect(Action::GridOpen);
    harness.assert_state(|s| s.screen == Screen::Detail { id: 5 });
    settle!(harness, source);

    harness.assert_state(|s| {
        s.detail
            .data()
            .is_some_and(|d| d.height_m() == "4.00" && d.weight_kg() == "6.00")
    });

    harness.dispatch_collect(Action::DetailClose);
    harness.assert_state(|s| s.screen == Screen::List && s.list.items.len() == 20);
}

#[tokio::test]
async fn test_sprites_resolve_once_per_image() {
    let source = MockSource::new(100);
    source.with_sprites();
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);

    harness.assert_state(|s| s.sprites.len() == 20);
    harness.assert_state(|s| s.sprites.values().all(|sprite| sprite.is_loaded()));
    assert_eq!(source.image_calls.load(Ordering::SeqCst), 20);

    // The detail screen reuses the card's sprite
    harness.dispatch_collect(Action::GridOpen);
    settle!(harness, source);
    harness.assert_state(|s| {
        s.detail
            .data()
            .is_some_and(|detail| s.sprite(detail).is_some())
    });
    assert_eq!(source.image_calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_broken_sprite_keeps_card_ready() {
    let source = MockSource::new(100);
    source.with_sprites();
    source.break_image(2);
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::ListFetch);
    settle!(harness, source);

    harness.assert_state(|s| s.cards.iter().all(|c| c.detail.is_loaded()));
    harness.assert_state(|s| s.sprites[&sprite_url(2)].is_failed());
    harness.assert_state(|s| s.sprites[&sprite_url(1)].is_loaded());
}
