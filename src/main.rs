use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use sprout::core::config::{SproutConfig, load_config, resolve};
use std::fs::File;

#[derive(Parser)]
#[command(name = "sprout", about = "Terminal client for a farming-advice assistant")]
struct Args {
    /// Server base URL (overrides SPROUT_BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Log level for sprout.log
    #[arg(long, default_value = "debug")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // The terminal UI owns stdout, so logs go to a file
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("sprout.log") {
        let _ = WriteLogger::init(args.log_level, log_config, log_file);
    }

    let file_config = load_config().unwrap_or_else(|e| {
        log::warn!("{}; falling back to defaults", e);
        SproutConfig::default()
    });
    let config = resolve(&file_config, args.base_url.as_deref());
    log::info!("Sprout starting up against {}", config.base_url);

    sprout::tui::run(config)
}
