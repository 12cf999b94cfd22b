//! Persisted board document.
//!
//! Boards are stored as JSON with PascalCase keys. Loading validates the
//! document shape before any [`BoardState`](crate::board::BoardState) is built,
//! so a rejected file never replaces the board already in memory.

pub mod data;
pub mod io;

pub use data::{BoardDocument, DocumentError, TileRecord};
