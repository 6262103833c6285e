pub mod controller;
pub mod state;

pub use controller::{SessionController, SessionEvent, SessionSnapshot};
pub use state::{FormSession, SessionStats, SessionStatus, PRESENCE_MIN_CONFIDENCE};
