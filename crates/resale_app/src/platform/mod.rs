mod app;
mod config;
mod effects;
mod ui;

pub(crate) use app::{run_app, CliMode};
