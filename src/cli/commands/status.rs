//! Status command: report whether data has been uploaded

use super::shared::{connect, load_configuration};
use crate::cli::args::GlobalArgs;
use crate::cli::render::print_status;
use anyhow::Result;
use tracing::info;

pub fn run_status(global: &GlobalArgs) -> Result<()> {
    let config = load_configuration(global)?;
    let dashboard = connect(config)?;

    let status = dashboard.status()?;
    info!(
        "Table exists: {}, rows: {}",
        status.table_exists, status.rows
    );

    print_status(&status, &dashboard.store().target().to_string());
    Ok(())
}
