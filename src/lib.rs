//! HTTP bridge to a KataGo subprocess.
//!
//! Each request spawns a fresh engine process, replays the client's board
//! over GTP, asks for one move or one position evaluation, and tears the
//! process down again. No state survives a request.
//!
//! See [`api`] for the HTTP surface and [`engine`] for the process
//! lifecycle.

pub mod api;
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod gtp;
pub mod rank;
