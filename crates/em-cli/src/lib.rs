//! CLI library components for the entity matcher.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod review;
pub mod summary;
