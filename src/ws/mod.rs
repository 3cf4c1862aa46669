//! WebSocket transport for duel clients

pub mod handler;
pub mod protocol;
