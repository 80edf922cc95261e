use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tui_dispatch::DataResource;

use super::{
    ACCENT, Component, DANGER, HIGHLIGHT, SpriteView, SpriteViewProps, TEXT_DIM, TEXT_MAIN,
    spinner_frame,
};
use crate::action::Action;
use crate::sprite::SpriteData;
use crate::state::{CardState, ListItem, display_name};

/// Rows taken by one card, borders included.
pub const CARD_HEIGHT: u16 = 9;

const TEXT_ROWS: u16 = 3;

pub struct PokemonCardProps<'a> {
    pub item: &'a ListItem,
    pub card: &'a CardState,
    pub sprite: Option<&'a SpriteData>,
    pub is_selected: bool,
    pub tick: u64,
}

/// One grid cell: spinner while resolving, red "Error" on failure, sprite,
/// dex number, name and types once ready.
#[derive(Default)]
pub struct PokemonCard;

impl Component<Action> for PokemonCard {
    type Props<'a> = PokemonCardProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let border = match (&props.card.detail, props.is_selected) {
            (_, true) => Style::default().fg(HIGHLIGHT),
            (DataResource::Failed(_), false) => Style::default().fg(DANGER),
            _ => Style::default().fg(TEXT_DIM),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if props.is_selected {
                BorderType::Thick
            } else {
                BorderType::Rounded
            })
            .border_style(border);

        let name = display_name(&props.item.name);
        let lines = match &props.card.detail {
            DataResource::Loaded(detail) => vec![
                Line::from(Span::styled(detail.dex_number(), Style::default().fg(TEXT_DIM))),
                Line::from(Span::styled(
                    name,
                    Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    detail
                        .types
                        .iter()
                        .map(|t| display_name(&t.name))
                        .collect::<Vec<_>>()
                        .join(" / "),
                    Style::default().fg(ACCENT),
                )),
            ],
            DataResource::Failed(_) => vec![
                Line::from(""),
                Line::from(Span::styled("Error", Style::default().fg(DANGER).bold())),
                Line::from(Span::styled(
                    if props.is_selected { "t to retry" } else { "" },
                    Style::default().fg(TEXT_DIM),
                )),
            ],
            DataResource::Loading | DataResource::Empty => vec![
                Line::from(""),
                Line::from(Span::styled(
                    spinner_frame(props.tick),
                    Style::default().fg(ACCENT),
                )),
            ],
        };

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text_area = if props.card.detail.is_loaded() {
            let chunks = Layout::vertical([Constraint::Min(0), Constraint::Length(TEXT_ROWS)])
                .split(inner);
            SpriteView.render(
                frame,
                chunks[0],
                SpriteViewProps {
                    sprite: props.sprite,
                },
            );
            chunks[1]
        } else {
            Layout::vertical([Constraint::Length(TEXT_ROWS)])
                .flex(Flex::Center)
                .split(inner)[0]
        };
        frame.render_widget(Paragraph::new(lines).centered(), text_area);
    }
}
