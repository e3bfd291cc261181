//! Command line interface
//!
//! `pytestgen path/to/module.py [--run]` writes `path/to/test_module.py`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::llm::AzureChatClient;
use crate::services::{GeneratorOptions, TestGenerator};

/// Generate a pytest file for a Python module with Azure OpenAI.
#[derive(Parser, Debug)]
#[command(name = "pytestgen", version, about)]
pub struct Cli {
    /// Path to the .py file to generate tests for
    pub pyfile: PathBuf,

    /// Run pytest on the generated file afterwards
    #[arg(long)]
    pub run: bool,

    /// YAML configuration file (missing file means defaults)
    #[arg(long, default_value = "pytestgen.yml")]
    pub config: PathBuf,

    /// Do not send the module source to the model, only the function list
    #[arg(long)]
    pub no_source: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load_with_env(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        tracing::info!("Configuration loaded");

        let mut options = GeneratorOptions::from(&config);
        if self.no_source {
            options.prompt.include_source = false;
        }

        let client = AzureChatClient::from_config(&config.llm)?;
        tracing::info!("Using chat completions endpoint {}", client.url());
        let generator = TestGenerator::new(Arc::new(client), options);

        println!("[i] Calling the model to generate tests (this may take a few seconds)...");
        let mut report = generator.generate(&self.pyfile).await?;
        println!("[OK] Generated: {}", report.output_path.display());

        if self.run {
            println!("Running pytest on {} ...", report.output_path.display());
            let code = generator.run_tests(&mut report).await?;
            println!("pytest finished with exit code {}", code);
        }

        Ok(())
    }
}
