//! Timed practice sessions in the terminal: load a deck, answer against a
//! countdown, get scored, and leave a lifecycle trail behind.

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod navigation;
pub mod parser;
pub mod progress;
pub mod scoring;
pub mod services;
pub mod state;
pub mod store;
pub mod timer;
pub mod tui;
pub mod ui;
