// HTTP request handlers module
// JSON API under /api, public HTML pages at / and /item/:slug

pub mod admin;
pub mod api;
pub mod pages;
