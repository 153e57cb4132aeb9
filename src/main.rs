use clap::Parser;
use contractflow::{cli, logging, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let _logging = logging::init(&args.workspace)?;
    cli::run(args).await
}
