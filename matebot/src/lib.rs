//! MateBot daemon library.
//!
//! Exposes the [`app::App`] orchestrator so integration tests and embedding
//! interfaces can run the full stack in-process.

pub mod app;

pub use app::App;
