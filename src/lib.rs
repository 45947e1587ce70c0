//! Agri-Sage: plant-leaf disease diagnosis with a conversational assistant.
//!
//! An uploaded leaf photo goes through [`classifier`]; the diagnosis is then
//! phrased by the hosted LLM in [`gemini`], or by the canned replies in
//! [`fallback`] whenever that service cannot be reached.

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod conversation;
pub mod crops;
pub mod error;
pub mod fallback;
pub mod gemini;
#[cfg(feature = "tensorflow")]
pub mod model;
pub mod preprocess;
pub mod prompts;
pub mod retry;
pub mod routes;
pub mod state;

pub use error::{Error, Result};
pub use routes::router;
pub use state::{AppContext, SharedContext};
