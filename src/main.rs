use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dining_philosophers::{ConsoleReporter, Dinner, TableConfig};
use tracing_subscriber::EnvFilter;

/// Dining philosophers: N philosophers share N forks around a ring
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of philosophers (at least 2)
    number_of_philosophers: usize,
}

fn main() -> ExitCode {
    // 診断ログは stderr へ。哲学者の出力 (stdout) とは別
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help と --version は成功扱い。それ以外の引数エラーは 1 で終了
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match TableConfig::new(cli.number_of_philosophers) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dinner = Dinner::new(config);
    match dinner.serve(Arc::new(ConsoleReporter::stdout())) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
