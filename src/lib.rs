pub mod config;
pub mod format;
pub mod logging;
pub mod poller;
pub mod service;
pub mod store;
pub mod system;
