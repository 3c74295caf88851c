pub mod app;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod console;
pub mod demo;
pub mod history;
pub mod logger;
pub mod overlay;
pub mod render;
pub mod sessions;

pub use app::build_router;
pub use console::{Console, ConsoleEvent, ConsoleSnapshot, Dispatch, LineKind};
