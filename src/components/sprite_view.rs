use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::Paragraph,
};

use super::Component;
use crate::action::Action;
use crate::sprite::SpriteData;

pub struct SpriteViewProps<'a> {
    pub sprite: Option<&'a SpriteData>,
}

/// Sprite centered in its area; renders nothing until the sprite is loaded.
#[derive(Default)]
pub struct SpriteView;

impl Component<Action> for SpriteView {
    type Props<'a> = SpriteViewProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let Some(sprite) = props.sprite else {
            return;
        };
        let (cols, rows) = sprite.fit(area.width, area.height);
        if cols == 0 || rows == 0 {
            return;
        }

        let row = Layout::vertical([Constraint::Length(rows)])
            .flex(Flex::Center)
            .split(area)[0];
        let cell = Layout::horizontal([Constraint::Length(cols)])
            .flex(Flex::Center)
            .split(row)[0];
        frame.render_widget(Paragraph::new(sprite.lines(area.width, area.height)), cell);
    }
}
