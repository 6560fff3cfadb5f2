pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod logging;
pub mod pages;
pub mod render;
