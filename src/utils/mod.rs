// Startup configuration and small shared helpers

pub mod config;
pub mod html;
