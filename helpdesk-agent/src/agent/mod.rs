pub mod agent;
pub mod agent_factory;
pub mod classifier;
pub mod fallback;
pub mod react;
