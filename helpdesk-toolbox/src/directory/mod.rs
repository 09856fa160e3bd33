pub mod directory;
pub mod http_directory;
pub mod memory_directory;
pub mod directory_tools;
