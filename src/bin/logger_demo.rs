use rapport::logger::*;
use rapport::settings::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    // $ cargo run --bin logger_demo -- --settings=settings/dev.toml
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;
    trace!("application trace log");
    debug!("application debug log");
    info!("application info log");
    debug!(target: "rapport::demo", "crate-scoped debug log");

    Ok(())
}
