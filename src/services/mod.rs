//! Services layer
//!
//! This module contains the test generation workflow and its steps:
//! - Building prompts from a scanned module
//! - Repairing the model's reply into a valid test file header
//! - Running pytest on the result

pub mod generator;
pub mod header;
pub mod prompt;
pub mod runner;

pub use generator::{
    test_path_for, GenerationReport, GeneratorError, GeneratorOptions, TestGenerator,
};
pub use header::{ensure_imports_and_header, module_import, strip_code_fences};
pub use prompt::{build_prompts, NO_FUNCTIONS_LISTING, SYSTEM_PROMPT};
pub use runner::{PytestRunner, RunnerError};
