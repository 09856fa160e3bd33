pub mod conversation;
pub mod workflow;
