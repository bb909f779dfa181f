//! Ten-ball server library.
//!
//! Physics, rules and the networked table, exposed for tests and binaries.

pub mod ball;
pub mod bot;
pub mod config;
pub mod error;
pub mod events;
pub mod game_loop;
pub mod physics;
pub mod player;
pub mod predictor;
pub mod protocol;
pub mod rack;
pub mod rules;
pub mod schedule;
pub mod shot;
pub mod state;
pub mod table;
pub mod ws;
