use netwait::cli::{self, args::Cli};
use netwait::poller::{STATUS_INVALID_INPUT, STATUS_UNEXPECTED};
use tracing::{error, info};

fn main() {
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) => match cli::usage_error_status(&e) {
            // --help and --version
            None => e.exit(),
            Some(code) => {
                let _ = e.print();
                std::process::exit(code);
            }
        },
    };

    if let Err(e) = cli::init_logging(cli.verbose) {
        eprintln!("{:#}", e);
    }

    // Probes are I/O bound, the multi-thread runtime keeps a stuck one from
    // starving the coordinator
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            std::process::exit(STATUS_UNEXPECTED);
        }
    };

    let code = match runtime.block_on(cli::run(cli)) {
        Ok(outcome) => {
            info!(status = outcome.status_code(), "{}", outcome);
            outcome.status_code()
        }
        Err(e) => {
            error!("{:#}", e);
            STATUS_INVALID_INPUT
        }
    };

    // Abandoned attempts must not hold up the exit
    runtime.shutdown_background();
    std::process::exit(code);
}
