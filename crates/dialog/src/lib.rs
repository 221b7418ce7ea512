pub mod dispatch;
pub mod event;

pub use dispatch::{recovery_text, IntentDispatcher, OrderCommandService, OrderIntent};
pub use event::{extract_session_id, IntentEvent, IntentParameters};
