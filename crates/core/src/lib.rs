pub mod config;
pub mod domain;
pub mod errors;
pub mod menu;

pub use domain::order::{OrderDraft, Removal};
pub use domain::session::SessionId;
pub use errors::{EventError, OrderError};
