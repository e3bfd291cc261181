//! Data models
//!
//! This module contains the data structures shared across pytestgen:
//! - What the scanner learns about a Python module
//! - Chat messages exchanged with the model

mod message;
mod module;

pub use message::{ChatMessage, PromptPair, Role};
pub use module::{ModuleInfo, PythonFunction};
