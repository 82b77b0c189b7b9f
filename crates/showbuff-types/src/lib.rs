pub mod api;
pub mod events;
pub mod import;
pub mod models;
