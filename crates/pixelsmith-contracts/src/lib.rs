pub mod chat;
pub mod errors;
pub mod events;
pub mod history;
pub mod models;
pub mod prompt;
