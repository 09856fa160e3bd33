pub mod tool;
pub mod knowledge;
pub mod hardware;
pub mod software;
pub mod password;
pub mod device;
pub mod directory;
