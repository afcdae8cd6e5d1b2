//! Logging system demonstration
//!
//! Reads `CATALOG_*` variables, installs the subscriber and emits a few
//! catalog-shaped events.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format at debug level
//! CATALOG_LOG_FORMAT=json CATALOG_LOG_LEVEL=debug cargo run --example logging_demo
//!
//! # With custom filter
//! CATALOG_LOG_FILTER="logging_demo=trace" cargo run --example logging_demo
//! ```

use core_runtime::logging::init_logging;
use core_runtime::CatalogConfig;
use tracing::{debug, info, info_span, warn};

fn main() {
    let config = match CatalogConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Include this example's own target so its events are visible
    let mut logging = config.logging_config();
    if logging.filter.is_none() {
        logging = logging.with_filter(format!(
            "logging_demo={},core_runtime={}",
            config.log_level.as_str(),
            config.log_level.as_str()
        ));
    }

    if let Err(e) = init_logging(logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    info!(database = %config.database_label(), "=== Logging System Demo ===");

    let span = info_span!("create_album", ean = "0602445706679");
    let _guard = span.enter();

    debug!(sql = "SELECT 1", "Built album query");
    info!(album_id = 1, tracks = 2, "Album created");
    warn!(album_id = 1, "Failed to send album notification");

    info!("=== Demo Complete ===");
}
