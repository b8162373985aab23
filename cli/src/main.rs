use anyhow::Result;
use clap::{Parser, Subcommand};
use geminal_core::{ModelTier, agent, config, providers, tools};
mod commands;
mod onboard;
mod render;
mod repl;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "geminal")]
#[command(about = "geminal - a terminal chat client for Gemini with local tools", long_about = None)]
struct Cli {
    /// Enable debug logging for the chat runtime
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Onboard,
    Chat {
        #[arg(short, long)]
        message: Option<String>,
        /// flash, pro or pro-thinking
        #[arg(long)]
        model: Option<ModelTier>,
        #[arg(long)]
        system: Option<String>,
        #[arg(long)]
        no_tools: bool,
    },
}

fn init_tracing(verbose: u8) {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    if verbose > 0 {
        for directive in ["geminal_core=debug", "geminal=debug"] {
            if let Ok(parsed) = directive.parse() {
                env_filter = env_filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Chat {
                message: None,
                model: None,
                system: None,
                no_tools: false,
            }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("❌ Onboarding failed: {}", e);
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::Chat {
            message,
            model,
            system,
            no_tools,
        } => {
            let config = config::Config::load_or_init()?;

            let provider = match providers::create_provider(&config) {
                Ok(provider) => provider,
                Err(e) => {
                    eprintln!("❌ Error: {}", e);
                    anyhow::bail!("Startup failed: {}", e);
                }
            };

            let mut tool_registry = agent::ToolRegistry::new();
            tool_registry.register_server(tools::standard_server());

            let agent_loop =
                agent::AgentLoop::new(Arc::from(provider), Arc::new(tool_registry))
                    .with_max_turns(config.max_turns);

            let settings = commands::ChatSettings {
                tier: model.unwrap_or(config.model),
                system_instruction: system.or(config.system_instruction),
                tools_enabled: config.tools_enabled && !no_tools,
            };

            let mut repl = repl::Repl::new(agent_loop, settings);

            if let Some(msg) = message {
                if !repl.submit(&msg, std::io::stdout()).await? {
                    anyhow::bail!("Chat failed");
                }
            } else {
                if let Err(e) = config::ensure_geminal_dir() {
                    tracing::warn!("Input history disabled: {}", e);
                } else {
                    repl = repl.with_history_path(config::get_history_path());
                }
                repl.run().await?;
            }
        }
    }

    Ok(())
}
