//! Reducer - pure function: (state, action) -> DispatchResult

use tracing::{debug, warn};
use tui_dispatch::{DataResource, DispatchResult};

use crate::action::Action;
use crate::api::parse_cursor;
use crate::effect::Effect;
use crate::state::{AppState, CardState, ListItem, ListPhase, PokemonDetail, Screen};

/// The reducer handles all state transitions
pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        // ===== List controller =====
        Action::ListFetch => {
            if !matches!(state.list.phase, ListPhase::Idle | ListPhase::Failed) {
                return DispatchResult::unchanged();
            }
            reset_list(state, ListPhase::InitialLoading);
            DispatchResult::changed_with(first_page(state))
        }

        Action::ListRefresh => {
            if !matches!(
                state.list.phase,
                ListPhase::Ready | ListPhase::Failed | ListPhase::LoadingMore
            ) {
                return DispatchResult::unchanged();
            }
            reset_list(state, ListPhase::Refreshing);
            DispatchResult::changed_with(first_page(state))
        }

        Action::ListLoadMore => {
            if state.list.phase != ListPhase::Ready {
                return DispatchResult::unchanged();
            }
            let Some(next) = state.list.next_cursor.as_deref() else {
                return DispatchResult::unchanged();
            };
            let Some(cursor) = parse_cursor(next) else {
                warn!(cursor = next, "ignoring unparseable next-page cursor");
                return DispatchResult::unchanged();
            };
            state.list.phase = ListPhase::LoadingMore;
            state.list.request += 1;
            DispatchResult::changed_with(Effect::FetchPage {
                request: state.list.request,
                offset: cursor.offset,
                limit: cursor.limit,
            })
        }

        Action::ListDidLoad { request, page } => {
            if request != state.list.request {
                debug!(request, current = state.list.request, "dropping stale page");
                return DispatchResult::unchanged();
            }
            let effects = match state.list.phase {
                ListPhase::InitialLoading | ListPhase::Refreshing => {
                    state.list.items.clear();
                    state.cards.clear();
                    state.selected = 0;
                    append_items(state, page.items)
                }
                ListPhase::LoadingMore => append_items(state, page.items),
                _ => return DispatchResult::unchanged(),
            };
            state.list.next_cursor = page.next_cursor;
            state.list.total = page.total.or(state.list.total);
            state.list.phase = ListPhase::Ready;
            state.list.error = None;
            DispatchResult::changed_with_many(effects)
        }

        Action::ListDidError { request, error } => {
            if request != state.list.request {
                return DispatchResult::unchanged();
            }
            match state.list.phase {
                ListPhase::InitialLoading | ListPhase::Refreshing => {
                    warn!(%error, "list load failed");
                    state.list.items.clear();
                    state.cards.clear();
                    state.selected = 0;
                    state.list.next_cursor = None;
                    state.list.phase = ListPhase::Failed;
                    state.list.error = Some(error);
                    DispatchResult::changed()
                }
                ListPhase::LoadingMore => {
                    warn!(%error, "load more failed, keeping current list");
                    state.list.phase = ListPhase::Ready;
                    DispatchResult::changed()
                }
                _ => DispatchResult::unchanged(),
            }
        }

        // ===== Card resolvers =====
        Action::CardDidLoad { mount, detail } => {
            let Some(index) = state.cards.iter().position(|c| c.mount == mount) else {
                return DispatchResult::unchanged();
            };
            let sprite = request_sprite(state, &detail);
            state.cards[index].detail = DataResource::Loaded(detail);
            changed_with_optional(sprite)
        }

        Action::CardDidError { mount, error } => {
            let Some(card) = state.cards.iter_mut().find(|c| c.mount == mount) else {
                return DispatchResult::unchanged();
            };
            warn!(mount, %error, "card detail failed");
            card.detail = DataResource::Failed(error);
            DispatchResult::changed()
        }

        Action::CardRetry(index) => {
            let failed = state
                .cards
                .get(index)
                .map(|card| card.detail.is_failed())
                .unwrap_or(false);
            let Some(item) = state.list.items.get(index).cloned() else {
                return DispatchResult::unchanged();
            };
            if !failed {
                return DispatchResult::unchanged();
            }
            let effect = mount_card(state, index, &item);
            DispatchResult::changed_with(effect)
        }

        // ===== Sprites =====
        Action::SpriteDidLoad { url, sprite } => match state.sprites.get_mut(&url) {
            Some(entry) => {
                *entry = DataResource::Loaded(sprite);
                DispatchResult::changed()
            }
            None => DispatchResult::unchanged(),
        },

        Action::SpriteDidError { url, error } => match state.sprites.get_mut(&url) {
            Some(entry) => {
                warn!(%url, %error, "sprite failed");
                *entry = DataResource::Failed(error);
                DispatchResult::changed()
            }
            None => DispatchResult::unchanged(),
        },

        // ===== Grid =====
        Action::GridSelect(index) => {
            if index < state.cards.len() && index != state.selected {
                state.selected = index;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::GridOpen => {
            let Some(id) = state
                .selected_card()
                .and_then(|(_, card)| card.resolved())
                .map(|detail| detail.id)
            else {
                return DispatchResult::unchanged();
            };
            state.screen = Screen::Detail { id };
            state.detail = DataResource::Loading;
            DispatchResult::changed_with(Effect::FetchDetail { id })
        }

        // ===== Detail screen =====
        Action::DetailDidLoad { id, detail } => {
            if state.screen != (Screen::Detail { id }) {
                return DispatchResult::unchanged();
            }
            let sprite = request_sprite(state, &detail);
            state.detail = DataResource::Loaded(detail);
            changed_with_optional(sprite)
        }

        Action::DetailDidError { id, error } => {
            if state.screen != (Screen::Detail { id }) {
                return DispatchResult::unchanged();
            }
            state.detail = DataResource::Failed(error);
            DispatchResult::changed()
        }

        Action::DetailRetry => match state.screen {
            Screen::Detail { id } if state.detail.is_failed() => {
                state.detail = DataResource::Loading;
                DispatchResult::changed_with(Effect::FetchDetail { id })
            }
            _ => DispatchResult::unchanged(),
        },

        Action::DetailClose => {
            if state.screen == Screen::List {
                return DispatchResult::unchanged();
            }
            state.screen = Screen::List;
            state.detail = DataResource::Empty;
            DispatchResult::changed()
        }

        // ===== Global =====
        Action::Tick => {
            if state.is_busy() {
                state.tick = state.tick.wrapping_add(1);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

/// Start a sprite download unless one is already loaded or in flight.
fn request_sprite(state: &mut AppState, detail: &PokemonDetail) -> Option<Effect> {
    let url = detail.image_url.as_ref()?;
    if state
        .sprites
        .get(url)
        .is_some_and(|sprite| sprite.is_loading() || sprite.is_loaded())
    {
        return None;
    }
    state.sprites.insert(url.clone(), DataResource::Loading);
    Some(Effect::FetchSprite { url: url.clone() })
}

fn changed_with_optional(effect: Option<Effect>) -> DispatchResult<Effect> {
    match effect {
        Some(effect) => DispatchResult::changed_with(effect),
        None => DispatchResult::changed(),
    }
}

fn reset_list(state: &mut AppState, phase: ListPhase) {
    state.list.items.clear();
    state.list.next_cursor = None;
    state.list.error = None;
    state.list.phase = phase;
    state.list.request += 1;
    state.cards.clear();
    state.selected = 0;
}

fn first_page(state: &AppState) -> Effect {
    Effect::FetchPage {
        request: state.list.request,
        offset: 0,
        limit: state.page_limit,
    }
}

/// Append in arrival order and mount a card for every new item.
fn append_items(state: &mut AppState, items: Vec<ListItem>) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(items.len());
    for item in items {
        let index = state.list.items.len();
        state.list.items.push(item.clone());
        state.cards.push(CardState::mounted(0));
        effects.push(mount_card(state, index, &item));
    }
    effects
}

fn mount_card(state: &mut AppState, index: usize, item: &ListItem) -> Effect {
    let mount = state.next_mount;
    state.next_mount += 1;
    state.cards[index] = CardState::mounted(mount);
    Effect::ResolveCard {
        mount,
        reference: item.url.clone(),
    }
}
