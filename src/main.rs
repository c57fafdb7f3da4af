// src/main.rs

use initdag::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("initdag error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns whether every task succeeded (or the run was a dry run).
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
