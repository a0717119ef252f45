//! `uccm board`: board listing, description, validation and templates.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use uccm_board::{
    board_to_toml, builtin_boards, discover_boards, find_board, generate_template, validate_board,
    Severity,
};

/// List built-in boards and any project boards.
pub fn list(project_dir: Option<&Path>) -> Result<()> {
    println!("Built-in boards:");
    println!();
    for (name, description) in builtin_boards() {
        println!("  {name:<25} {description}");
    }

    if let Some(dir) = project_dir {
        let custom = discover_boards(dir)?;
        if !custom.is_empty() {
            println!();
            println!("Project boards:");
            println!();
            for (name, path) in &custom {
                println!("  {name:<25} {}", path.display());
            }
        }
    }

    println!();
    println!("Use 'uccm board describe <name>' for details.");
    Ok(())
}

/// Describe a board: family and leg table, or its TOML form.
pub fn describe(name: &str, project_dir: Option<&Path>, format: Option<&str>) -> Result<()> {
    let board = find_board(name, project_dir)
        .context("use 'uccm board list' to see available boards")?;

    if format == Some("toml") {
        print!("{}", board_to_toml(&board)?);
        return Ok(());
    }

    println!("=== Board: {} ===", board.name);
    println!("Family: {}", board.family);
    if let Some(description) = &board.description {
        println!("{description}");
    }
    println!();
    println!("--- Legs ({}) ---", board.legs.len());
    for (leg, binding) in &board.legs {
        let classes: Vec<&str> = binding.classes.iter().map(|c| c.as_str()).collect();
        let alternate = binding
            .alternate
            .map(|af| format!(" AF{af}"))
            .unwrap_or_default();
        println!(
            "  {:<14} {:<6}{:<5} {}",
            leg.as_str(),
            binding.physical().to_string(),
            alternate,
            classes.join(", ")
        );
    }
    Ok(())
}

/// Validate a board definition; errors fail the command, warnings do not.
pub fn validate(name: &str, project_dir: Option<&Path>) -> Result<()> {
    let board = find_board(name, project_dir)?;
    match validate_board(&board) {
        Ok(()) => {
            println!("Board '{}' is valid ({} legs).", board.name, board.legs.len());
            Ok(())
        }
        Err(issues) => {
            let mut errors = 0;
            for issue in &issues {
                match issue.severity {
                    Severity::Error => {
                        errors += 1;
                        eprintln!("error: {}", issue.message);
                    }
                    Severity::Warning => eprintln!("warning: {}", issue.message),
                }
            }
            if errors > 0 {
                bail!("board '{name}' has {errors} error(s)");
            }
            println!("Board '{}' is valid with {} warning(s).", board.name, issues.len());
            Ok(())
        }
    }
}

/// Write `boards/<name>.board.toml` from the template.
pub fn new(name: &str, project_dir: &Path) -> Result<()> {
    let boards_dir = project_dir.join("boards");
    let path = boards_dir.join(format!("{name}.board.toml"));
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    fs::create_dir_all(&boards_dir)
        .with_context(|| format!("creating {}", boards_dir.display()))?;
    fs::write(&path, generate_template(name)?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}
