pub mod app;
pub mod card;
pub mod composer;
pub mod config;
pub mod error;
pub mod feeds;
pub mod gateway;
pub mod hashtags;
pub mod logging;
pub mod ui;
