//! TOML parsing, serialization, validation, and discovery for board definitions.
//!
//! Project boards live in `boards/<name>.board.toml`. A project board shadows
//! a built-in board of the same name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::board::{Board, CapabilityClass, PhysicalPin};
use crate::error::{BoardError, Result};

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A validation issue found in a board definition.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }
}

/// Names and descriptions of the built-in boards.
pub fn builtin_boards() -> Vec<(&'static str, &'static str)> {
    vec![
        ("nucleo-f303re", "NUCLEO-F303RE (STM32F303RE)"),
        ("stm32f3-discovery", "STM32F3DISCOVERY (STM32F303VC)"),
    ]
}

fn builtin_board(name: &str) -> Option<Board> {
    match name {
        "stm32f3-discovery" => Some(Board::stm32f3_discovery()),
        "nucleo-f303re" => Some(Board::nucleo_f303re()),
        _ => None,
    }
}

/// Resolve a board by name: project `boards/` directory first, then built-ins.
pub fn find_board(name: &str, project_dir: Option<&Path>) -> Result<Board> {
    if let Some(dir) = project_dir {
        let path = dir.join("boards").join(format!("{name}.board.toml"));
        if path.is_file() {
            debug!(board = name, path = %path.display(), "loading project board");
            return load_board_toml(&path);
        }
    }
    builtin_board(name).ok_or_else(|| BoardError::UnknownBoard {
        name: name.to_string(),
    })
}

/// Load a board from a `.board.toml` file.
pub fn load_board_toml(path: &Path) -> Result<Board> {
    if !path.exists() {
        return Err(BoardError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_board_toml(&content)
}

/// Parse a board from a TOML string.
pub fn parse_board_toml(toml_str: &str) -> Result<Board> {
    let board: Board = toml::from_str(toml_str)?;
    Ok(board)
}

/// Serialize a board to pretty TOML.
pub fn board_to_toml(board: &Board) -> Result<String> {
    let toml_str = toml::to_string_pretty(board)?;
    Ok(toml_str)
}

/// GPIO lines per port.
pub const PINS_PER_PORT: u8 = 16;

/// Alternate-function selectors per pin (`AF0`..`AF15`).
pub const ALTERNATE_FUNCTIONS: u8 = 16;

/// Validate a board definition for structural correctness.
///
/// Returns `Ok(())` if there is nothing to report, or `Err(issues)`.
pub fn validate_board(board: &Board) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if board.name.trim().is_empty() {
        issues.push(ValidationIssue::error("board has an empty name".into()));
    }
    if board.family.trim().is_empty() {
        issues.push(ValidationIssue::error(format!(
            "board '{}' has no MCU family",
            board.name
        )));
    }

    let mut by_pin: BTreeMap<PhysicalPin, Vec<&str>> = BTreeMap::new();
    for (leg, binding) in &board.legs {
        let valid_ident = leg
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !leg.as_str().is_empty();
        if !valid_ident {
            issues.push(ValidationIssue::error(format!(
                "leg '{leg}' is not a valid identifier"
            )));
        }

        if binding.classes.is_empty() {
            issues.push(ValidationIssue::error(format!(
                "leg '{leg}' supports no capability classes"
            )));
        }

        if binding.pin >= PINS_PER_PORT {
            issues.push(ValidationIssue::error(format!(
                "leg '{leg}' uses pin {} of port {}; ports have pins 0-{}",
                binding.pin,
                binding.port,
                PINS_PER_PORT - 1
            )));
        }
        if let Some(af) = binding.alternate.filter(|af| *af >= ALTERNATE_FUNCTIONS) {
            issues.push(ValidationIssue::error(format!(
                "leg '{leg}' selects alternate function {af}; selectors are 0-{}",
                ALTERNATE_FUNCTIONS - 1
            )));
        }

        let has_alternate_class = binding.supports(CapabilityClass::Alternate);
        match (binding.alternate, has_alternate_class) {
            (Some(af), false) => issues.push(ValidationIssue::error(format!(
                "leg '{leg}' has alternate function {af} but does not list the alternate class"
            ))),
            (None, true) => issues.push(ValidationIssue::warning(format!(
                "leg '{leg}' lists the alternate class without an alternate-function selector"
            ))),
            _ => {}
        }

        by_pin.entry(binding.physical()).or_default().push(leg.as_str());
    }

    for (pin, legs) in by_pin {
        if legs.len() > 1 {
            issues.push(ValidationIssue::warning(format!(
                "legs {} alias physical pin {pin}",
                legs.join(", ")
            )));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Generate a template `.board.toml` for a new board, seeded from the
/// STM32F3DISCOVERY leg table.
pub fn generate_template(name: &str) -> Result<String> {
    let mut board = Board::stm32f3_discovery();
    board.name = name.into();
    board.description = None;
    board_to_toml(&board)
}

/// Discover all `.board.toml` files in a project's `boards/` directory.
///
/// Returns `(board_name, file_path)` pairs sorted by name.
pub fn discover_boards(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let boards_dir = project_dir.join("boards");
    if !boards_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut boards = Vec::new();
    for entry in std::fs::read_dir(&boards_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".board.toml"))
            .map(str::to_string);
        if let Some(name) = name {
            boards.push((name, path));
        }
    }
    boards.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(boards)
}
