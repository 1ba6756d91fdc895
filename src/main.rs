// src/main.rs

use watchrun::errors::SetupError;
use watchrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        if let Some(SetupError::Usage(msg)) = err.downcast_ref::<SetupError>() {
            eprintln!("Error: {msg}");
            eprintln!("Usage: watchrun '<command>'");
        } else {
            eprintln!("watchrun error: {err:?}");
        }
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
