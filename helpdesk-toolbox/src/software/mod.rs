pub mod software_tools;
