pub mod message;
pub mod store;
pub mod hub;

pub use message::{Quote, QuoteTable, BoardEvent, BoardMessage};
pub use store::QuoteStore;
pub use hub::NotificationHub;
