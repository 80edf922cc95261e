use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tui_dispatch::{DataResource, EventKind};
use tui_dispatch_components::{
    StatusBar, StatusBarHint, StatusBarProps, StatusBarSection, StatusBarStyle,
};

use super::{
    ACCENT, Component, DANGER, ErrorView, ErrorViewProps, LoadingIndicator,
    LoadingIndicatorProps, SpriteView, SpriteViewProps, TEXT_DIM, TEXT_MAIN,
};
use crate::action::Action;
use crate::sprite::SpriteData;
use crate::state::{AppState, PokemonDetail, PokemonStat, display_name, stat_label};

/// Highest base stat any Pokemon can have; full bar.
pub const MAX_BASE_STAT: u16 = 255;

const STAT_BAR_WIDTH: usize = 30;

const SPRITE_PANEL_WIDTH: u16 = 24;

pub struct DetailScreenProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

#[derive(Default)]
pub struct DetailScreen;

impl Component<Action> for DetailScreen {
    type Props<'a> = DetailScreenProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }

        match event {
            EventKind::Key(key) => match key.code {
                KeyCode::Esc | KeyCode::Backspace => Some(Action::DetailClose),
                KeyCode::Char('r') | KeyCode::F(5) if props.state.detail.is_failed() => {
                    Some(Action::DetailRetry)
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Help bar
        ])
        .split(area);

        match &props.state.detail {
            DataResource::Loaded(detail) => render_detail(
                frame,
                chunks[0],
                detail,
                props.state.sprite(detail),
            ),
            DataResource::Failed(error) => ErrorView.render(
                frame,
                chunks[0],
                ErrorViewProps {
                    message: Some(error.as_str()),
                    retry_key: Some("r"),
                },
            ),
            DataResource::Loading => LoadingIndicator.render(
                frame,
                chunks[0],
                LoadingIndicatorProps {
                    label: "Loading details...",
                    tick: props.state.tick,
                },
            ),
            DataResource::Empty => ErrorView.render(
                frame,
                chunks[0],
                ErrorViewProps {
                    message: Some("Pokémon not found"),
                    retry_key: None,
                },
            ),
        }

        let mut hints = vec![StatusBarHint::new("esc", "back")];
        if props.state.detail.is_failed() {
            hints.push(StatusBarHint::new("r", "retry"));
        }
        hints.push(StatusBarHint::new("q", "quit"));

        let mut status_bar = StatusBar::new();
        <StatusBar as Component<Action>>::render(
            &mut status_bar,
            frame,
            chunks[1],
            StatusBarProps {
                left: StatusBarSection::empty(),
                center: StatusBarSection::hints(&hints),
                right: StatusBarSection::empty(),
                style: StatusBarStyle::default(),
                is_focused: false,
            },
        );
    }
}

fn render_detail(
    frame: &mut Frame,
    area: Rect,
    detail: &PokemonDetail,
    sprite: Option<&SpriteData>,
) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(1),    // Sections
    ])
    .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            detail.display_name(),
            Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(detail.dex_number(), Style::default().fg(TEXT_DIM)),
    ]))
    .centered()
    .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(TEXT_DIM)));
    frame.render_widget(header, chunks[0]);

    let text_area = if detail.image_url.is_some() {
        let columns = Layout::horizontal([
            Constraint::Length(SPRITE_PANEL_WIDTH),
            Constraint::Min(1),
        ])
        .split(chunks[1]);
        SpriteView.render(frame, columns[0], SpriteViewProps { sprite });
        columns[1]
    } else {
        chunks[1]
    };

    frame.render_widget(
        Paragraph::new(detail_text(detail)).wrap(Wrap { trim: false }),
        text_area,
    );
}

/// Basic info, types, abilities and stats in reading order.
pub fn detail_text(detail: &PokemonDetail) -> Text<'static> {
    let mut lines = vec![
        section_title("Basic info"),
        info_line("Height", format!("{} m", detail.height_m())),
        info_line("Weight", format!("{} kg", detail.weight_kg())),
        Line::from(""),
        section_title("Types"),
        Line::from(
            detail
                .types
                .iter()
                .flat_map(|t| {
                    [
                        Span::styled(
                            format!(" {} ", display_name(&t.name)),
                            Style::default().fg(Color::White).bg(ACCENT),
                        ),
                        Span::raw(" "),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    ];

    if !detail.abilities.is_empty() {
        lines.push(Line::from(""));
        lines.push(section_title("Abilities"));
        for ability in &detail.abilities {
            let mut spans = vec![Span::styled(
                format!("  {}", display_name(&ability.name)),
                Style::default().fg(TEXT_MAIN),
            )];
            if ability.is_hidden {
                spans.push(Span::styled(" (hidden)", Style::default().fg(TEXT_DIM)));
            }
            lines.push(Line::from(spans));
        }
    }

    if !detail.stats.is_empty() {
        lines.push(Line::from(""));
        lines.push(section_title("Stats"));
        lines.extend(detail.stats.iter().map(stat_line));
    }

    Text::from(lines)
}

fn section_title(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))
}

fn info_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label}: "), Style::default().fg(TEXT_DIM)),
        Span::styled(value, Style::default().fg(TEXT_MAIN)),
    ])
}

fn stat_line(stat: &PokemonStat) -> Line<'static> {
    let filled = stat_bar_len(stat.base_value, STAT_BAR_WIDTH);
    let color = if stat.base_value >= 100 { ACCENT } else { DANGER };
    Line::from(vec![
        Span::styled(
            format!("  {:<16}", format!("{}:", stat_label(&stat.name))),
            Style::default().fg(TEXT_DIM),
        ),
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::styled(
            "░".repeat(STAT_BAR_WIDTH - filled),
            Style::default().fg(TEXT_DIM),
        ),
        Span::styled(format!(" {:>3}", stat.base_value), Style::default().fg(TEXT_MAIN)),
    ])
}

/// Bar cells proportional to `base / 255`, capped at `width`.
pub fn stat_bar_len(base: u16, width: usize) -> usize {
    let ratio = f64::from(base.min(MAX_BASE_STAT)) / f64::from(MAX_BASE_STAT);
    (ratio * width as f64).round() as usize
}
