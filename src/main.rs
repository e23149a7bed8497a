use clap::Parser;
use servetool::cli::Cli;
use servetool::config::Config;
use servetool::error::ServeError;
use servetool::{logger, server};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("servetool: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ServeError> {
    let cfg = Config::load(cli)?;
    logger::init(&cfg).map_err(ServeError::Logger)?;

    // Single-threaded runtime: connections are served one at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ServeError::Runtime)?;

    runtime.block_on(server::run(cfg))
}
