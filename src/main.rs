use anyhow::Context;
use clap::Parser;
use tracing::error;

use review_sentiment::{
    cli::{self, Cli, Command},
    config::Config,
    observability::Telemetry,
};

fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(
                thread = thread_name,
                message, "panic occurred without location information"
            );
        }
    }));

    let options = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let telemetry =
        Telemetry::new(config.log_format()).context("failed to initialize telemetry")?;

    let outcome = match &options.command {
        Command::Analyze(args) => cli::analyze(args, &config, Some(telemetry.metrics()))
            .and_then(|report| serde_json::to_string_pretty(&report).map_err(Into::into)),
        Command::Summarize(args) => cli::summarize(args, &config)
            .and_then(|report| serde_json::to_string_pretty(&report).map_err(Into::into)),
    };

    if options.print_metrics {
        eprint!("{}", telemetry.render_prometheus());
    }

    match outcome {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "command failed");
            Err(err)
        }
    }
}
