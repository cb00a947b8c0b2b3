// ABOUTME: Tokenvault server bootstrap shared by the binary and its tests
// ABOUTME: Wires configuration, storage, the state cache and the HTTP router together

pub mod config;
pub mod health;
pub mod server;

pub use config::{Config, ConfigError, StateCacheBackend};
pub use server::{build_app, migrate, run_server, spawn_state_reaper, App};
