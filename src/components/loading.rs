use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{ACCENT, Component, TEXT_DIM};
use crate::action::Action;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner_frame(tick: u64) -> &'static str {
    SPINNER_FRAMES[(tick % SPINNER_FRAMES.len() as u64) as usize]
}

pub struct LoadingIndicatorProps<'a> {
    pub label: &'a str,
    pub tick: u64,
}

/// Centered spinner with a label underneath.
#[derive(Default)]
pub struct LoadingIndicator;

impl Component<Action> for LoadingIndicator {
    type Props<'a> = LoadingIndicatorProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([Constraint::Length(1), Constraint::Length(1)])
            .flex(Flex::Center)
            .split(area);

        frame.render_widget(
            Paragraph::new(
                Line::from(Span::styled(
                    spinner_frame(props.tick),
                    Style::default().fg(ACCENT).bold(),
                ))
                .centered(),
            ),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(
                Line::from(Span::styled(
                    props.label.to_string(),
                    Style::default().fg(TEXT_DIM),
                ))
                .centered(),
            ),
            chunks[1],
        );
    }
}
