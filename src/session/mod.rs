mod manager;
mod storage;

pub use manager::{AuthPhase, LoginOutcome, RequestAttempt, SessionManager};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
