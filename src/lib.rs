//! pytestgen - generate pytest suites with an Azure OpenAI chat deployment
//!
//! This library scans a Python module for its top-level functions, asks a
//! chat model for a matching pytest file, and repairs the reply before it is
//! written next to the module.

pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod parser;
pub mod services;
