//! Types shared between the ten-ball table server and the browser host.

pub mod config;
pub mod protocol;
pub mod vec2;
