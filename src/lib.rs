pub mod app;
pub mod core;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod ui;
pub mod vcs;
