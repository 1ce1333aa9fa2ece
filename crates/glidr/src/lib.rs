//! # Glidr — Physics-Backed 2D Scene Engine
//!
//! A small frame loop for touch-driven 2D games: scenes of game objects with
//! optional rigid bodies, per-object behaviors, two collision signals, touch
//! hit-testing, and a transform pipeline that keeps sprites centred on their
//! physics bodies.
//!
//! Start with `use glidr::prelude::*`, build an [`Engine`](engine::Engine),
//! and call [`tick`](engine::Engine::tick) or [`frame`](engine::Engine::frame)
//! once per displayed frame.

pub mod collision;
pub mod config;
pub mod context;
pub mod engine;
pub mod input;
pub mod level;
pub mod math;
pub mod object;
pub mod physics2d;
pub mod prelude;
pub mod render2d;
pub mod scene;
pub mod sprite;
pub mod time;

/// Install `env_logger`, honoring `RUST_LOG` and defaulting to `info`.
/// Calling it more than once is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}
