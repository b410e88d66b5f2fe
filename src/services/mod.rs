// Business logic services module
// Persistence, authorization, and the chat command front-end

pub mod access_guard;
pub mod commands;
pub mod config_store;
pub mod item_store;
pub mod json_file;
pub mod telegram;
