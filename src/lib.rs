//! Interactive force-directed explorer for narrative events and the consequences predicted
//! from them.

pub mod app;
pub mod config;
pub mod service;
pub mod story;
mod util;
