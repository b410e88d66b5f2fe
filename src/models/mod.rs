// Data models shared by the stores and both front-ends

pub mod errors;
pub mod item;
pub mod site_config;
