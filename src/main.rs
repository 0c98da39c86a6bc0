use clap::Parser;
use relviz::cli::{Cli, Command};
use relviz::{cmd_columns, cmd_export, cmd_init, cmd_serve, cmd_summary};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("RELVIZ_LOG")
                .unwrap_or_else(|_| EnvFilter::new("relviz=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let exit_code = match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Export(args) => cmd_export(args),
        Command::Summary(args) => cmd_summary(args),
        Command::Columns(args) => cmd_columns(args),
        Command::Init(args) => cmd_init(args),
    };

    std::process::exit(exit_code);
}
