pub mod device_tools;
