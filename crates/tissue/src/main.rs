//! `tissue` -- git-native issue tracker CLI.
//!
//! Parses arguments with clap, resolves the runtime context, and dispatches
//! to command handlers. The store does the heavy lifting; this binary is
//! argument plumbing and rendering.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

fn main() {
    let cli = Cli::parse();
    let ctx = RuntimeContext::from_global_args(&cli.global);

    // Importer diagnostics land on stderr at WARN; --verbose opens DEBUG.
    // RUST_LOG overrides both.
    let default_filter = if ctx.verbose {
        "tissue=debug,tissue_store=debug,tissue_core=debug,tissue_config=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Some(Commands::Init(args)) => commands::init::run(&ctx, &args),
        Some(Commands::Create(args)) => commands::create::run(&ctx, &args),
        Some(Commands::Show(args)) => commands::show::run(&ctx, &args),
        Some(Commands::List(args)) => commands::list::run(&ctx, &args),
        Some(Commands::Ready(args)) => commands::ready::run(&ctx, &args),
        Some(Commands::StatusCmd(args)) => commands::status_cmd::run(&ctx, &args),
        Some(Commands::Update(args)) => commands::update::run(&ctx, &args),
        Some(Commands::Comment(args)) => commands::comment::run_add(&ctx, &args),
        Some(Commands::Comments(args)) => commands::comment::run_list(&ctx, &args),
        Some(Commands::Dep(args)) => commands::dep::run(&ctx, &args),
        Some(Commands::Search(args)) => commands::search::run(&ctx, &args),
        Some(Commands::Clean(args)) => commands::clean_cmd::run(&ctx, &args),
        Some(Commands::Migrate(args)) => commands::migrate_cmd::run(&ctx, &args),
        Some(Commands::Reimport) => commands::reimport::run(&ctx),
        Some(Commands::Config(args)) => commands::config_cmd::run(&ctx, &args),
        Some(Commands::Completion(args)) => commands::completion::run(&args),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
