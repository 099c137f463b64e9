use clap::Parser;
use ncbi_mcp::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = ncbi_mcp::logging::init(cli.debug, cli.log_format) {
        eprintln!("ncbi-mcp: {e}");
    }

    let code = ncbi_mcp::run(cli).await;

    // The stdin relay may still be blocked in a read; don't wait for it.
    std::process::exit(code);
}
