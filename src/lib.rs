pub mod config;
pub mod console;
pub mod format;
pub mod json;
pub mod logging;
pub mod server;
pub mod system;
