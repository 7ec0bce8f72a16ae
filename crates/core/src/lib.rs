//! Relay logic for filerelay.
//!
//! This crate holds everything between the HTTP layer and the outside world.
//!
//! # Modules
//!
//! - `identifier` - Public id generation
//! - `host` - Document hosts (Telegram Bot API, in-memory)
//! - `store` - Mapping stores (in-memory, Cloudflare Workers KV)
//! - `relay` - Upload/download orchestration

pub mod host;
pub mod identifier;
pub mod relay;
pub mod store;
