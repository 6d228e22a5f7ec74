//! taskloop - single-agent task loop
//!
//! Main entry point for the CLI application.

use clap::Parser;
use taskloop::{cli, Agent, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// taskloop - plan a goal into tasks and work them with shell and HTTP tools
#[derive(Parser, Debug)]
#[command(name = "taskloop")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Goal to work on (prompted for when omitted)
    goal: Vec<String>,

    /// Model served by Ollama
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Maximum generations across the run
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Maximum reasoning steps per task
    #[arg(long)]
    max_steps: Option<usize>,

    /// Disable the terminal tool
    #[arg(long)]
    no_terminal: bool,

    /// Disable the internet tool
    #[arg(long)]
    no_internet: bool,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print the run trace as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskloop={}", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load()?;

    // Apply CLI overrides
    if let Some(model) = args.model {
        config.model.name = model;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.agent.max_iterations = max_iterations;
    }
    if let Some(max_steps) = args.max_steps {
        config.agent.max_reasoning_steps = max_steps;
    }
    if args.no_terminal {
        config.tools.terminal_enabled = false;
    }
    if args.no_internet {
        config.tools.internet_enabled = false;
    }
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    if args.save_config {
        let path = config.save()?;
        println!("Configuration saved to {}", path.display());
        return Ok(());
    }

    init_logging(&config.logging.level);

    let mut agent = Agent::with_config(config)?;
    agent.load().await?;

    let goal = if args.goal.is_empty() {
        match cli::read_goal()? {
            Some(goal) => goal,
            None => {
                println!("No goal provided. Goodbye!");
                return Ok(());
            }
        }
    } else {
        args.goal.join(" ")
    };

    let result = agent.run(&goal).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("\n{}", cli::render_result(&result));
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
