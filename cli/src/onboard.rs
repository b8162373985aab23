use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use geminal_core::ModelTier;
use geminal_core::config::{Config, get_config_path};

const BANNER: &str = r"
    ------------------------------------------------
      __ _  ___ _ __ ___ (_)_ __   __ _| |
     / _` |/ _ \ '_ ` _ \| | '_ \ / _` | |
    | (_| |  __/ | | | | | | | | | (_| | |
     \__, |\___|_| |_| |_|_|_| |_|\__,_|_|
     |___/
    ------------------------------------------------
";

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_api_key() -> Result<String> {
    let api_key: String = Input::new()
        .with_prompt("Enter your Gemini API key (leave empty to use GEMINI_API_KEY)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read API key")?;

    Ok(api_key.trim().to_string())
}

fn setup_model() -> Result<ModelTier> {
    let labels: Vec<String> = ModelTier::ALL
        .iter()
        .map(|tier| format!("{} ({})", tier, tier.model_id()))
        .collect();

    let selection = Select::new()
        .with_prompt("Select your default model")
        .items(&labels)
        .default(0)
        .interact()
        .context("Failed to select model")?;

    Ok(ModelTier::ALL[selection])
}

fn setup_system_instruction() -> Result<Option<String>> {
    let instruction: String = Input::new()
        .with_prompt("Default system instruction (optional)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read system instruction")?;

    let instruction = instruction.trim();
    Ok((!instruction.is_empty()).then(|| instruction.to_string()))
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to Geminal!").white().bold());
    println!(
        "  {}",
        style("This wizard will configure your terminal chat in under 30 seconds.").dim()
    );
    println!();

    print_step(1, 3, "API Key Setup");
    let api_key = setup_api_key()?;
    if api_key.is_empty() {
        println!(
            "  {} No key stored; GEMINI_API_KEY will be read at start-up.",
            style("!").yellow()
        );
    }

    print_step(2, 3, "Model Selection");
    let model = setup_model()?;

    print_step(3, 3, "System Instruction");
    let system_instruction = setup_system_instruction()?;

    let config = Config {
        api_key,
        model,
        system_instruction,
        ..Default::default()
    };

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(get_config_path().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("geminal chat").cyan().bold()
    );
    println!();

    Ok(config)
}
