pub mod password_tools;
