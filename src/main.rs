use clap::Parser;
use rentmax::api::{Cli, Command, run_calc, run_http_server};
use rentmax::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(config) => {
            init_logging(&config.log_filter);
            if let Err(e) = run_http_server(config).await {
                tracing::error!(error = %e, "server stopped");
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Calc(args) => {
            init_logging("warn");
            match run_calc(&args) {
                Ok(out) => print!("{out}"),
                Err(e) => {
                    eprintln!("Calc error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
