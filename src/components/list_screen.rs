use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{
    StatusBar, StatusBarHint, StatusBarProps, StatusBarSection, StatusBarStyle,
};

use super::{
    ACCENT, Component, ErrorView, ErrorViewProps, LoadingIndicator, LoadingIndicatorProps,
    PokemonGrid, PokemonGridProps, TEXT_DIM,
};
use crate::action::Action;
use crate::state::{AppState, ListPhase};

pub struct ListScreenProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

/// The list screen: title, then spinner, error or grid depending on the list
/// phase, then the key hints.
#[derive(Default)]
pub struct ListScreen {
    grid: PokemonGrid,
}

impl ListScreen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component<Action> for ListScreen {
    type Props<'a> = ListScreenProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }
        let phase = props.state.list.phase;

        if let EventKind::Key(key) = event {
            if matches!(key.code, KeyCode::Char('r') | KeyCode::F(5)) {
                return match phase {
                    ListPhase::Failed => vec![Action::ListFetch],
                    ListPhase::Ready | ListPhase::LoadingMore => vec![Action::ListRefresh],
                    _ => Vec::new(),
                };
            }
        }

        if matches!(phase, ListPhase::Ready | ListPhase::LoadingMore) {
            self.grid
                .handle_event(
                    event,
                    PokemonGridProps {
                        state: props.state,
                        is_focused: true,
                    },
                )
                .into_iter()
                .collect()
        } else {
            Vec::new()
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let state = props.state;
        let chunks = Layout::vertical([
            Constraint::Length(1), // Title
            Constraint::Min(1),    // Body
            Constraint::Length(1), // Help bar
        ])
        .split(area);

        frame.render_widget(Paragraph::new(title_line(state)), chunks[0]);

        match state.list.phase {
            ListPhase::Idle | ListPhase::InitialLoading => LoadingIndicator.render(
                frame,
                chunks[1],
                LoadingIndicatorProps {
                    label: "Loading Pokémon...",
                    tick: state.tick,
                },
            ),
            ListPhase::Refreshing => LoadingIndicator.render(
                frame,
                chunks[1],
                LoadingIndicatorProps {
                    label: "Refreshing...",
                    tick: state.tick,
                },
            ),
            ListPhase::Failed => ErrorView.render(
                frame,
                chunks[1],
                ErrorViewProps {
                    message: state.list.error.as_deref(),
                    retry_key: Some("r"),
                },
            ),
            ListPhase::Ready | ListPhase::LoadingMore => self.grid.render(
                frame,
                chunks[1],
                PokemonGridProps {
                    state,
                    is_focused: props.is_focused,
                },
            ),
        }

        let mut status_bar = StatusBar::new();
        <StatusBar as Component<Action>>::render(
            &mut status_bar,
            frame,
            chunks[2],
            StatusBarProps {
                left: StatusBarSection::empty(),
                center: StatusBarSection::hints(&[
                    StatusBarHint::new("←↑↓→", "move"),
                    StatusBarHint::new("enter", "open"),
                    StatusBarHint::new("r", "refresh"),
                    StatusBarHint::new("t", "retry card"),
                    StatusBarHint::new("q", "quit"),
                ]),
                right: StatusBarSection::empty(),
                style: StatusBarStyle::default(),
                is_focused: false,
            },
        );
    }
}

fn title_line(state: &AppState) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " Pokédex",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    )];
    if let Some(total) = state.list.total {
        spans.push(Span::styled(
            format!("  {total} Pokémon"),
            Style::default().fg(TEXT_DIM),
        ));
    }
    Line::from(spans)
}
