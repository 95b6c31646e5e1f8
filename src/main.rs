use std::sync::Arc;

use nightly_exporter::config::{load_config, print_schema};
use nightly_exporter::startup;
use nightly_exporter::utils::logger::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::args().skip(1).any(|arg| arg == "--schema") {
        print_schema()?;
        return Ok(());
    }

    let config = Arc::new(load_config());
    init_logging(&config.logging)?;

    startup::run(config).await
}
