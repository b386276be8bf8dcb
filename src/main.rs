use clap::Parser;
use wildguard::cli::setup::{init_tracing, load_config_with_overrides};
use wildguard::cli::{
    analyze, handle_completions, handle_config_init, record, status, watch, Cli, Commands,
    ConfigCommands, SessionArgs,
};

/// Tracing is best effort; a failed init must not stop the command.
fn setup_tracing(args: &SessionArgs) {
    match load_config_with_overrides(args) {
        Ok(config) => {
            if let Err(e) = init_tracing(&config.logging) {
                eprintln!("Warning: Failed to initialize logging: {}", e);
            }
        }
        Err(e) => tracing::debug!(error = %e, "Skipping tracing setup"),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => {
            setup_tracing(&args.session);
            watch::handle_watch(&args).await
        }
        Commands::Status(args) => {
            setup_tracing(&args.session);
            match status::handle_status(&args).await {
                Ok(output) => {
                    println!("{}", output);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        Commands::Record(args) => {
            setup_tracing(&args.session);
            match record::handle_record(&args).await {
                Ok(output) => {
                    println!("{}", output);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        Commands::Analyze(args) => {
            setup_tracing(&args.session);
            match analyze::handle_analyze(&args).await {
                Ok(output) => {
                    println!("{}", output);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
