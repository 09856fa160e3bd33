pub(crate) mod compiled;
pub mod runtime_template;
