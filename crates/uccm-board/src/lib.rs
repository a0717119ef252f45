//! Board definitions for uccm builds.
//!
//! A [`Board`] names its MCU family and maps every logical [`Leg`] to a
//! physical pin together with the capability classes that pin supports.
//! Boards come from the built-in set or from `boards/<name>.board.toml`
//! files in a project.

pub mod board;
pub mod error;
pub mod parse;

pub use board::{Board, BoardBinding, CapabilityClass, Leg, PhysicalPin};
pub use error::{BoardError, Result};
pub use parse::{
    builtin_boards, discover_boards, find_board, generate_template, load_board_toml,
    parse_board_toml, board_to_toml, validate_board, Severity, ValidationIssue,
};
