// src/main.rs

use docwatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    // Exit explicitly: a pending console read must not hold the runtime open.
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("docwatch error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
