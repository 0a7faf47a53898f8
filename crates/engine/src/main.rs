//! Questline Engine - Main entry point.
//!
//! A terminal loop over the engine: one line in, one resolved action out.
//!
//! ```text
//! questline-engine [name] [class]
//! ```
//!
//! Lines starting with `/` are commands: `/roll <dice>`, `/status`, `/quit`.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questline_domain::{AbilityScores, CharacterClass, CharacterState, SessionId};
use questline_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    memory_store::InMemoryStore,
    ollama::OllamaClient,
    ports::{ClockPort, KeyValueStore, LlmPort, RandomPort},
    resilient_llm::{ResilientLlmClient, RetryConfig},
    settings::EngineConfig,
};
use questline_engine::use_cases::{ActionError, ActionResponse, NewCharacter};
use questline_engine::App;

const LOCAL_USER: &str = "local";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questline_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Questline Engine");

    let config = EngineConfig::from_env();

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new(clock.clone()));

    let ollama_client = Arc::new(OllamaClient::new(&config.ollama_base_url, &config.ollama_model));
    let retry_config = RetryConfig {
        max_retries: config.narrator_max_retries,
        ..RetryConfig::default()
    };
    tracing::info!(
        "LLM client configured with retry: max_retries={}, base_delay_ms={}",
        retry_config.max_retries,
        retry_config.base_delay_ms
    );
    let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(ollama_client, retry_config));

    let app = App::new(store, llm, clock, random, &config);

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "Adventurer".to_string());
    let class: CharacterClass = match args.next() {
        Some(raw) => raw.parse().context("unknown character class")?,
        None => CharacterClass::Fighter,
    };

    let started = app
        .use_cases
        .start_session
        .execute(LOCAL_USER, starter_sheet(name, class), None)
        .await?;
    println!(
        "{} the {} arrives at {}.",
        started.character.name(),
        started.character.class(),
        started.location
    );
    print_character(&started.character);

    run_loop(&app, started.session_id).await
}

async fn run_loop(app: &App, session_id: SessionId) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/roll", notation) => match app.use_cases.roll_dice.execute(notation) {
                Ok(result) => println!("{}", result.breakdown()),
                Err(e) => println!("! {}", e),
            },
            ("/status", _) => {
                let view = app
                    .use_cases
                    .session_view
                    .execute(session_id, LOCAL_USER)
                    .await?;
                println!("{} ({:?})", view.location, view.phase);
                print_character(&view.character);
                println!("tokens today: {}", view.usage_today.total_tokens());
            }
            _ => match app
                .use_cases
                .process_action
                .execute(session_id, LOCAL_USER, line)
                .await
            {
                Ok(response) => {
                    print_response(&response);
                    if response.session_ended {
                        println!("Your adventure is over.");
                        break;
                    }
                }
                Err(
                    e @ (ActionError::BudgetExceeded { .. }
                    | ActionError::NarratorUnavailable { .. }),
                ) => {
                    println!("! {} (retryable: {})", e, e.is_retryable());
                }
                Err(e) => return Err(e.into()),
            },
        }
    }

    tracing::info!(session_id = %session_id, "Session closed");
    Ok(())
}

fn starter_sheet(name: String, class: CharacterClass) -> NewCharacter {
    NewCharacter {
        name,
        class,
        abilities: AbilityScores::new(15, 14, 13, 12, 10, 8),
        max_hp: 12,
        gold: 25,
        starting_items: vec![
            "short sword".to_string(),
            "leather armor".to_string(),
            "torch".to_string(),
        ],
    }
}

fn print_response(response: &ActionResponse) {
    println!("\n{}\n", response.narrative);
    for roll in &response.dice_rolls {
        println!("  [{}] {} -> {}", roll.label, roll.notation, roll.total);
    }
    for tx in &response.transactions {
        println!("  * {}", tx.summary());
    }
    for enemy in &response.enemies {
        println!(
            "  {}{} {}/{} HP, AC {}",
            if enemy.targeted { "> " } else { "  " },
            enemy.name,
            enemy.hp,
            enemy.max_hp,
            enemy.armor_class
        );
    }
    print_character(&response.character);
}

fn print_character(character: &CharacterState) {
    println!(
        "  {} | HP {}/{} | AC {} | {} gold | {} XP",
        character.name(),
        character.hp(),
        character.max_hp(),
        character.armor_class(),
        character.gold(),
        character.xp()
    );
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
