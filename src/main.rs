// src/main.rs

use testpool::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("testpool error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let summary = run(args).await?;
    if !summary.is_success() {
        anyhow::bail!("Some tests failed");
    }
    Ok(())
}
