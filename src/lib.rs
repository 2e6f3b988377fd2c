pub mod animation;
pub mod api;
pub mod config;
pub mod deck;
pub mod engine;
pub mod gesture;
pub mod ui;
