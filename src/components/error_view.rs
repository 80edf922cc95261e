use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::{ACCENT, Component, DANGER, TEXT_DIM};
use crate::action::Action;

pub const ERROR_ICON: &str = "\u{26a0}\u{fe0f}";

pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong while loading data.";

pub struct ErrorViewProps<'a> {
    pub message: Option<&'a str>,
    /// Key shown in the retry hint; no hint when `None`.
    pub retry_key: Option<&'a str>,
}

/// Full-area error message with an optional retry hint.
#[derive(Default)]
pub struct ErrorView;

impl Component<Action> for ErrorView {
    type Props<'a> = ErrorViewProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let message = props.message.unwrap_or(DEFAULT_ERROR_MESSAGE);
        let chunks = Layout::vertical([
            Constraint::Length(1), // icon
            Constraint::Length(1), // "Error"
            Constraint::Length(message_rows(message, area)),
            Constraint::Length(1), // blank
            Constraint::Length(1), // hint
        ])
        .flex(Flex::Center)
        .split(area);

        frame.render_widget(
            Paragraph::new(Line::from(ERROR_ICON).centered()),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(
                Line::from(Span::styled("Error", Style::default().fg(DANGER).bold())).centered(),
            ),
            chunks[1],
        );
        frame.render_widget(
            Paragraph::new(
                Line::from(Span::styled(
                    message.to_string(),
                    Style::default().fg(DANGER),
                ))
                .centered(),
            )
            .wrap(Wrap { trim: true }),
            chunks[2],
        );
        if let Some(key) = props.retry_key {
            frame.render_widget(
                Paragraph::new(
                    Line::from(vec![
                        Span::styled("Press ", Style::default().fg(TEXT_DIM)),
                        Span::styled(key.to_string(), Style::default().fg(ACCENT).bold()),
                        Span::styled(" to try again", Style::default().fg(TEXT_DIM)),
                    ])
                    .centered(),
                ),
                chunks[4],
            );
        }
    }
}

/// Rows for the wrapped message plus two spare for word breaks, bounded by
/// what is left after the fixed rows.
fn message_rows(message: &str, area: Rect) -> u16 {
    let width = usize::from(area.width.max(1));
    let wanted = message.chars().count().div_ceil(width) + 2;
    let available = area.height.saturating_sub(4).max(1);
    u16::try_from(wanted).unwrap_or(u16::MAX).clamp(1, available)
}
