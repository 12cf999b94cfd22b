//! bingoboard - Achievement Bingo Board Builder
//!
//! A cross-platform CLI for building and tracking achievement bingo boards:
//! tile grids with points, row and column bonuses, special set tiles, and
//! images searched on the wiki, cached on disk and optionally uploaded.

pub mod app;
pub mod board;
pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod logging;
pub mod remote;
pub mod signal;
pub mod worker;

pub use app::run_app;
