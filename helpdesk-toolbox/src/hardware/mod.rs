pub mod hardware_tools;
