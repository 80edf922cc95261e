//! Pokédex TUI
//!
//! Paginated PokeAPI browser built on tui-dispatch. The library exposes the
//! client, the store pieces and the components for testing.

pub mod action;
pub mod api;
pub mod components;
pub mod config;
pub mod effect;
pub mod logging;
pub mod reducer;
pub mod sprite;
pub mod state;
