use clap::Parser;
use histbridge_cli::commands::cli::{Args, Commands};
use histbridge_cli::commands::{paths, serve};
use histbridge_cli::logging::init_tracing;
use histbridge_core::api::CliError;
use histbridge_core::config;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = Args::parse();
    let loaded = config::load_from(args.config.as_deref())
        .map_err(|e| CliError::Config(format!("{e:#}")))?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Paths => paths::handle_paths(&loaded),
        Commands::Serve => {
            init_tracing(&loaded.cfg.logging, &loaded.paths.log_dir).map_err(CliError::Command)?;
            serve::handle_serve(&loaded).await
        }
    }
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success, including shutdown on a signal
    // 11: config error
    // 20: IO error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}
