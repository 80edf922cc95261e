pub mod detail_screen;
pub mod error_view;
pub mod loading;
pub mod pokemon_card;
pub mod pokemon_grid;
pub mod list_screen;
pub mod sprite_view;

use ratatui::style::Color;

// Re-export core Component trait
pub use tui_dispatch::Component;

pub use detail_screen::{DetailScreen, DetailScreenProps};
pub use error_view::{ErrorView, ErrorViewProps, ERROR_ICON};
pub use list_screen::{ListScreen, ListScreenProps};
pub use loading::{spinner_frame, LoadingIndicator, LoadingIndicatorProps};
pub use pokemon_card::{PokemonCard, PokemonCardProps, CARD_HEIGHT};
pub use pokemon_grid::{PokemonGrid, PokemonGridProps};
pub use sprite_view::{SpriteView, SpriteViewProps};

pub const ACCENT: Color = Color::Rgb(59, 130, 246);
pub const DANGER: Color = Color::Rgb(239, 68, 68);
pub const TEXT_MAIN: Color = Color::Rgb(229, 231, 235);
pub const TEXT_DIM: Color = Color::Rgb(107, 114, 128);
pub const HIGHLIGHT: Color = Color::Rgb(250, 204, 21);
