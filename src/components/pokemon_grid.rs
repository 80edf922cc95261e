//! Responsive card grid.
//!
//! Column count follows the viewport width on every render. Moving the
//! selection while the last row is on screen, or near it, emits
//! `ListLoadMore`; the reducer decides whether a fetch actually happens.

use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use tui_dispatch::EventKind;

use super::{ACCENT, CARD_HEIGHT, Component, PokemonCard, PokemonCardProps, TEXT_DIM, spinner_frame};
use crate::action::Action;
use crate::state::{AppState, columns_for_width};

pub struct PokemonGridProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

pub struct PokemonGrid {
    columns: usize,
    visible_rows: usize,
    scroll_row: usize,
}

impl Default for PokemonGrid {
    fn default() -> Self {
        Self {
            columns: columns_for_width(0),
            visible_rows: 0,
            scroll_row: 0,
        }
    }
}

impl PokemonGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns used by the last render.
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn scroll_row(&self) -> usize {
        self.scroll_row
    }

    fn move_to(&self, state: &AppState, target: usize) -> Vec<Action> {
        let mut actions = Vec::new();
        if target != state.selected {
            actions.push(Action::GridSelect(target));
        }
        if state.list.next_cursor.is_some() && self.is_near_end(target, state.cards.len()) {
            actions.push(Action::ListLoadMore);
        }
        actions
    }

    /// Last row already visible, or `index` within half a viewport of it.
    fn is_near_end(&self, index: usize, len: usize) -> bool {
        let columns = self.columns.max(1);
        let last_row = len.div_ceil(columns).saturating_sub(1);
        if last_row < self.scroll_row + self.visible_rows {
            return true;
        }
        let row = index / columns;
        let threshold = (self.visible_rows / 2).max(1);
        last_row.saturating_sub(row) <= threshold
    }

    fn keep_selection_visible(&mut self, selected: usize, total_rows: usize) {
        let row = selected / self.columns.max(1);
        let visible = self.visible_rows.max(1);
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + visible {
            self.scroll_row = row + 1 - visible;
        }
        self.scroll_row = self.scroll_row.min(total_rows.saturating_sub(visible));
    }
}

impl Component<Action> for PokemonGrid {
    type Props<'a> = PokemonGridProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        let state = props.state;
        let len = state.cards.len();
        if !props.is_focused || len == 0 {
            return Vec::new();
        }
        let columns = self.columns.max(1);
        let selected = state.selected.min(len - 1);

        match event {
            EventKind::Key(key) => match key.code {
                KeyCode::Left | KeyCode::Char('h') => {
                    self.move_to(state, selected.saturating_sub(1))
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    self.move_to(state, (selected + 1).min(len - 1))
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_to(state, selected.checked_sub(columns).unwrap_or(selected))
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_to(state, (selected + columns).min(len - 1))
                }
                KeyCode::Home => self.move_to(state, 0),
                KeyCode::End => self.move_to(state, len - 1),
                KeyCode::Enter => vec![Action::GridOpen],
                KeyCode::Char('t') => match state.card(selected) {
                    Some((_, card)) if card.detail.is_failed() => {
                        vec![Action::CardRetry(selected)]
                    }
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            },
            EventKind::Scroll { delta, .. } => {
                if *delta > 0 {
                    self.move_to(state, (selected + columns).min(len - 1))
                } else if *delta < 0 {
                    self.move_to(state, selected.checked_sub(columns).unwrap_or(selected))
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        let chunks = Layout::vertical([Constraint::Min(CARD_HEIGHT), Constraint::Length(1)])
            .split(area);
        let grid_area = chunks[0];

        self.columns = columns_for_width(area.width);
        self.visible_rows = usize::from(grid_area.height / CARD_HEIGHT).max(1);
        let total_rows = state.cards.len().div_ceil(self.columns);
        self.keep_selection_visible(state.selected, total_rows);

        let row_areas = Layout::vertical(
            (0..self.visible_rows).map(|_| Constraint::Length(CARD_HEIGHT)),
        )
        .split(grid_area);
        let column_constraints: Vec<Constraint> = (0..self.columns)
            .map(|_| Constraint::Ratio(1, self.columns as u32))
            .collect();

        let mut card = PokemonCard;
        for (slot, row_area) in row_areas.iter().enumerate() {
            let row = self.scroll_row + slot;
            let cells = Layout::horizontal(column_constraints.clone()).split(*row_area);
            for (column, cell) in cells.iter().enumerate() {
                let index = row * self.columns + column;
                let Some((item, card_state)) = state.card(index) else {
                    break;
                };
                card.render(
                    frame,
                    *cell,
                    PokemonCardProps {
                        item,
                        card: card_state,
                        sprite: card_state.resolved().and_then(|detail| state.sprite(detail)),
                        is_selected: index == state.selected,
                        tick: state.tick,
                    },
                );
            }
        }

        frame.render_widget(Paragraph::new(footer_line(state)).centered(), chunks[1]);
    }
}

fn footer_line(state: &AppState) -> Line<'static> {
    let loaded = state.list.items.len();
    if state.list.is_loading_more() {
        return Line::from(vec![
            Span::styled(spinner_frame(state.tick), Style::default().fg(ACCENT)),
            Span::styled(" Loading more...", Style::default().fg(TEXT_DIM)),
        ]);
    }
    let text = if state.list.is_exhausted() {
        format!("All {loaded} loaded")
    } else {
        match state.list.total {
            Some(total) => format!("{loaded} of {total}"),
            None => format!("{loaded} loaded"),
        }
    };
    Line::from(Span::styled(text, Style::default().fg(TEXT_DIM)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CardState, ListItem, ListPhase};
    use crossterm::event::{KeyEvent, KeyModifiers};
    use tui_dispatch::testing::*;

    fn state_with(count: usize, next: bool) -> AppState {
        let mut state = AppState::default();
        state.list.phase = ListPhase::Ready;
        state.list.items = (0..count)
            .map(|i| ListItem {
                name: format!("mon-{i}"),
                url: format!("https://pokeapi.co/api/v2/pokemon/{}/", i + 1),
            })
            .collect();
        state.cards = (0..count as u64).map(CardState::mounted).collect();
        state.list.next_cursor =
            next.then(|| "https://pokeapi.co/api/v2/pokemon?offset=20&limit=20".to_string());
        state
    }

    fn press(grid: &mut PokemonGrid, state: &AppState, code: KeyCode) -> Vec<Action> {
        let event = EventKind::Key(KeyEvent::new(code, KeyModifiers::NONE));
        grid.handle_event(
            &event,
            PokemonGridProps {
                state,
                is_focused: true,
            },
        )
        .into_iter()
        .collect()
    }

    /// Area height holding `rows` card rows plus the footer.
    fn rows_high(rows: u16) -> u16 {
        CARD_HEIGHT * rows + 1
    }

    fn render(grid: &mut PokemonGrid, state: &AppState, width: u16, height: u16) -> String {
        let mut render = RenderHarness::new(width, height);
        render.render_to_string_plain(|frame| {
            grid.render(
                frame,
                frame.area(),
                PokemonGridProps {
                    state,
                    is_focused: true,
                },
            );
        })
    }

    #[test]
    fn test_columns_follow_render_width() {
        let state = state_with(6, false);
        let mut grid = PokemonGrid::new();
        render(&mut grid, &state, 80, rows_high(2));
        assert_eq!(grid.columns(), 2);
        render(&mut grid, &state, 120, rows_high(2));
        assert_eq!(grid.columns(), 3);
    }

    #[test]
    fn test_arrow_keys_move_by_cell_and_row() {
        let state = state_with(20, false);
        let mut grid = PokemonGrid::new();
        render(&mut grid, &state, 120, rows_high(3));

        let actions = press(&mut grid, &state, KeyCode::Right);
        actions.assert_first(Action::GridSelect(1));
        let actions = press(&mut grid, &state, KeyCode::Down);
        actions.assert_first(Action::GridSelect(3));
        press(&mut grid, &state, KeyCode::Left).assert_empty();
    }

    #[test]
    fn test_moving_near_end_requests_more() {
        let mut state = state_with(20, true);
        state.selected = 14;
        let mut grid = PokemonGrid::new();
        render(&mut grid, &state, 80, rows_high(3));

        let actions = press(&mut grid, &state, KeyCode::Down);
        assert_eq!(actions, vec![Action::GridSelect(16), Action::ListLoadMore]);
    }

    #[test]
    fn test_far_from_end_does_not_request_more() {
        let state = state_with(20, true);
        let mut grid = PokemonGrid::new();
        // 2 columns, 10 rows, 3 on screen
        render(&mut grid, &state, 80, rows_high(3));

        let actions = press(&mut grid, &state, KeyCode::Right);
        assert_eq!(actions, vec![Action::GridSelect(1)]);
    }

    #[test]
    fn test_visible_last_row_requests_more_on_any_move() {
        let state = state_with(20, true);
        let mut grid = PokemonGrid::new();
        // 3 columns, 7 rows, all of them on screen
        render(&mut grid, &state, 120, rows_high(8));

        let actions = press(&mut grid, &state, KeyCode::Right);
        assert_eq!(actions, vec![Action::GridSelect(1), Action::ListLoadMore]);
    }

    #[test]
    fn test_no_load_more_when_exhausted() {
        let mut state = state_with(20, false);
        state.selected = 18;
        let mut grid = PokemonGrid::new();
        render(&mut grid, &state, 80, rows_high(3));

        let actions = press(&mut grid, &state, KeyCode::Down);
        assert_eq!(actions, vec![Action::GridSelect(19)]);
    }

    #[test]
    fn test_enter_opens_and_t_retries_failed_card() {
        let mut state = state_with(4, false);
        let mut grid = PokemonGrid::new();

        press(&mut grid, &state, KeyCode::Enter).assert_first(Action::GridOpen);
        press(&mut grid, &state, KeyCode::Char('t')).assert_empty();

        state.cards[0].detail = tui_dispatch::DataResource::Failed("boom".into());
        press(&mut grid, &state, KeyCode::Char('t')).assert_first(Action::CardRetry(0));
    }

    #[test]
    fn test_selection_scrolls_into_view() {
        let mut state = state_with(20, false);
        let mut grid = PokemonGrid::new();
        render(&mut grid, &state, 80, rows_high(3));
        assert_eq!(grid.scroll_row(), 0);

        state.selected = 19;
        let output = render(&mut grid, &state, 80, rows_high(3));
        assert_eq!(grid.scroll_row(), 7);
        assert!(output.contains("All 20 loaded"));
    }

    #[test]
    fn test_unfocused_ignores_keys() {
        let state = state_with(4, false);
        let mut grid = PokemonGrid::new();
        let event = EventKind::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let actions: Vec<_> = grid
            .handle_event(
                &event,
                PokemonGridProps {
                    state: &state,
                    is_focused: false,
                },
            )
            .into_iter()
            .collect();
        actions.assert_empty();
    }
}
