pub mod message_history;
pub mod session_memory;
