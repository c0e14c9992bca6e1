use clap::Parser;

use resfs_cli::{Command, StoreArgs};

/// resfs - provision and inspect resfs stores
#[derive(Parser, Debug)]
#[command(name = "resfs")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    resfs_cli::logging::set_up_logging();

    if let Err(e) = resfs_cli::run(args.store, args.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
