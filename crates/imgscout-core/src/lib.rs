pub mod config;
pub mod logging;

pub mod augment;
pub mod browser;
pub mod candidate;
pub mod extract;
pub mod fetch;
pub mod rescue;
pub mod session;
pub mod validate;
