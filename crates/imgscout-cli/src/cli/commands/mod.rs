//! CLI command handlers, one file per subcommand.

mod augment;
mod fetch;
mod scrape;

pub use augment::run_augment;
pub use fetch::run_fetch;
pub use scrape::{run_scrape, ScrapeOptions};
