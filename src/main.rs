//! Conjure CLI entry point.
//!
//! This binary provides the `conjure` command for compiling workspace
//! schemas into kitty and tmux scripts and launching them.

use clap::Parser;
use conjure::cli::{Cli, Commands};
use conjure::error::Result;
use conjure::settings::AppConfig;
use conjure::{loader, ConjureError, Engine};
use std::process::Command;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run() -> Result<()> {
    let cli = Cli::parse();
    log::debug!("CLI args parsed: {:?}", cli);
    let app_cfg = loader::load_app_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { schema, no_exec } => run_schema(app_cfg, &schema, !no_exec),
        Commands::Compile { schema } => run_schema(app_cfg, &schema, false),
        Commands::List => print_schemas(&app_cfg),
        Commands::New { schema } => {
            let path = loader::create_schema(&app_cfg, &schema)?;
            println!("Created {}", path.display());
            Ok(())
        }
        Commands::Edit { schema } => edit_schema(&app_cfg, &schema),
        Commands::Save { file, name, force } => {
            let path = loader::save_schema(&app_cfg, &file, name.as_deref(), force)?;
            println!("Saved {}", path.display());
            Ok(())
        }
        Commands::Remove { schema, keep_schema } => remove_schema(app_cfg, &schema, keep_schema),
    }
}

/// Compile a schema and optionally launch its root script.
fn run_schema(app_cfg: AppConfig, schema: &str, launch: bool) -> Result<()> {
    let workspace = loader::load_schema(&app_cfg, schema)?;
    let engine = Engine::new(app_cfg);

    let compiled = engine.compile(&workspace, schema)?;
    println!("Compiled {}", compiled.root.display());
    for child in &compiled.children {
        println!("  nested {}", child.display());
    }

    if launch {
        engine.run(&workspace, schema)?;
    }
    Ok(())
}

/// Print all schemas with their project names.
fn print_schemas(app_cfg: &AppConfig) -> Result<()> {
    let names = loader::list_schemas(app_cfg)?;
    if names.is_empty() {
        println!("No schemas in {}", app_cfg.schemas_folder.display());
        return Ok(());
    }

    println!("Schemas:");
    for name in names {
        match loader::load_schema(app_cfg, &name) {
            Ok(ws) => match ws.project.description {
                Some(desc) => println!("  {} ({}) - {}", name, ws.project.name, desc),
                None => println!("  {} ({})", name, ws.project.name),
            },
            Err(e) => println!("  {} [invalid: {}]", name, e),
        }
    }
    Ok(())
}

/// Open a schema in `$EDITOR` (or `vi`) and check it still parses.
fn edit_schema(app_cfg: &AppConfig, schema: &str) -> Result<()> {
    let path = loader::schema_path(app_cfg, schema)?;
    let (program, args) = loader::editor_command(std::env::var("EDITOR").ok().as_deref())?;

    let status = Command::new(&program).args(&args).arg(&path).status()?;
    if !status.success() {
        return Err(ConjureError::ExecutionFailed(format!("{} {}", program, path.display())));
    }

    if let Err(e) = loader::load_workspace(&path) {
        eprintln!("Warning: {} no longer parses: {}", path.display(), e);
    }
    Ok(())
}

/// Delete compiled scripts and, unless kept, the schema file.
fn remove_schema(app_cfg: AppConfig, schema: &str, keep_schema: bool) -> Result<()> {
    let workspace = loader::load_schema(&app_cfg, schema)?;
    let engine = Engine::new(app_cfg);

    match engine.remove(&workspace, schema) {
        Ok(()) => println!("Removed scripts of {}", schema),
        Err(e @ ConjureError::ScriptNotFound { .. }) => log::warn!("{}", e),
        Err(e) => return Err(e),
    }

    if !keep_schema {
        let path = loader::remove_schema(engine.app_config(), schema)?;
        println!("Removed {}", path.display());
    }
    Ok(())
}
