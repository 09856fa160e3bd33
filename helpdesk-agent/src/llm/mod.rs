pub mod llm;
pub mod prompt;
pub mod anthropic_llm;
pub mod llm_factory;
pub mod openai_llm;
pub mod scripted_llm;
