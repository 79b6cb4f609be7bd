// src/main.rs

use mailbuild::{cli, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = run(args).await {
        eprintln!("mailbuild error: {err:#}");
        std::process::exit(1);
    }
}
