//! Entry point for the tense-tales story toolkit.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse the subcommand from the command line.
//! - Load configuration from `conf/config.toml`.
//! - Drive the compiler, store and AI client; warnings never abort.

mod ai;
mod compiler;
mod config;
mod shuffle;
mod store;
mod story;

use crate::ai::{AiClient, extract_story_source, story_prompt};
use crate::compiler::{compile_story, recover::recover_markdown};
use crate::config::{AppConfig, DEFAULT_CONFIG_PATH, load_config};
use crate::store::StoryStore;
use crate::story::Level;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: tense-tales <compile <story.md> | export <id> | list | delete <id> | generate <topic...> | models>";

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let config = load_config(Path::new(DEFAULT_CONFIG_PATH));
    set_log_level(reload_handle, config.log_level.as_filter_str());

    let mut args = env::args().skip(1);
    let command = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let store = StoryStore::new(&config.stories_dir);

    match command.as_str() {
        "compile" => {
            let path = args
                .next()
                .ok_or_else(|| anyhow!("Usage: tense-tales compile <story.md>"))?;
            cmd_compile(&store, Path::new(&path))
        }
        "export" => {
            let id = args
                .next()
                .ok_or_else(|| anyhow!("Usage: tense-tales export <id>"))?;
            cmd_export(&store, &id)
        }
        "list" => cmd_list(&store),
        "delete" => {
            let id = args
                .next()
                .ok_or_else(|| anyhow!("Usage: tense-tales delete <id>"))?;
            store.delete(&id)?;
            println!("Deleted story {id}");
            Ok(())
        }
        "generate" => {
            let topic = args.collect::<Vec<_>>().join(" ");
            if topic.trim().is_empty() {
                return Err(anyhow!("Usage: tense-tales generate <topic...>"));
            }
            cmd_generate(&config, &store, &topic)
        }
        "models" => cmd_models(&config),
        other => Err(anyhow!("Unknown command {other:?}\n{USAGE}")),
    }
}

fn cmd_compile(store: &StoryStore, path: &Path) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    info!(path = %path.display(), "Compiling story");

    let compiled = compile_story(&source);
    for warning in &compiled.warnings {
        warn!(id = %compiled.record.id, "{warning}");
    }
    store.put(&compiled.record)?;
    println!(
        "Saved story {} ({} verbs, level {})",
        compiled.record.id, compiled.record.verb_count, compiled.record.level
    );
    Ok(())
}

fn cmd_export(store: &StoryStore, id: &str) -> Result<()> {
    let record = store.get(id)?;
    print!("{}", recover_markdown(&record));
    Ok(())
}

fn cmd_list(store: &StoryStore) -> Result<()> {
    let records = store.list()?;
    if records.is_empty() {
        println!("No stories yet");
        return Ok(());
    }
    for record in records {
        println!(
            "{}  [{}]  {} verbs  {}",
            record.id, record.level, record.verb_count, record.title
        );
    }
    Ok(())
}

fn cmd_generate(config: &AppConfig, store: &StoryStore, topic: &str) -> Result<()> {
    if !config.ai.enabled {
        return Err(anyhow!("AI generation is disabled in the config"));
    }

    let client = AiClient::new(&config.ai)?;
    info!(topic, model = %config.ai.model, "Requesting AI story");
    let outcome = client.generate(&story_prompt(topic, Level::Intermediate))?;
    if !outcome.success {
        warn!("AI reply looked incomplete; compiling it anyway");
    }

    let source = extract_story_source(&outcome.content);
    if source.is_empty() {
        return Err(anyhow!("AI service returned no usable story text"));
    }

    let compiled = compile_story(&source);
    for warning in &compiled.warnings {
        warn!(id = %compiled.record.id, "{warning}");
    }
    store.put(&compiled.record)?;
    println!(
        "Saved AI story {} ({} verbs)",
        compiled.record.id, compiled.record.verb_count
    );
    Ok(())
}

fn cmd_models(config: &AppConfig) -> Result<()> {
    let client = AiClient::new(&config.ai)?;
    let models = client.list_models()?;
    if models.is_empty() {
        println!("AI service reports no models");
        return Ok(());
    }
    for model in models {
        let marker = if model == config.ai.model { " (active)" } else { "" };
        println!("{model}{marker}");
    }
    Ok(())
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    }
}
