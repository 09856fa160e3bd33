pub mod chains;
pub mod memory;
pub mod orchestrator;
pub mod session;
