//! Test generation workflow
//!
//! Scans a Python module, asks the chat model for a pytest file, repairs the
//! reply, and writes `test_<module>.py` next to the module.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::header::{ensure_imports_and_header, strip_code_fences};
use super::prompt::build_prompts;
use super::runner::{PytestRunner, RunnerError};
use crate::config::{Config, PromptConfig, PytestConfig};
use crate::llm::{ChatModel, LlmError};
use crate::parser::{extract_top_level_functions, ParseError};

/// Test generation errors
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Test generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Settings for one generator
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    pub prompt: PromptConfig,
    pub pytest: PytestConfig,
}

impl From<&Config> for GeneratorOptions {
    fn from(config: &Config) -> Self {
        Self {
            prompt: config.prompt.clone(),
            pytest: config.pytest.clone(),
        }
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Module name the tests were written for
    pub module: String,
    /// Where the test file was written
    pub output_path: PathBuf,
    /// Number of top-level functions offered to the model
    pub function_count: usize,
    /// pytest exit code, when pytest was run
    pub pytest_exit_code: Option<i32>,
}

/// Generates pytest files with a chat model
pub struct TestGenerator {
    model: Arc<dyn ChatModel>,
    options: GeneratorOptions,
}

impl TestGenerator {
    pub fn new(model: Arc<dyn ChatModel>, options: GeneratorOptions) -> Self {
        Self { model, options }
    }

    /// Generate and write the test file for `pyfile`.
    pub async fn generate(&self, pyfile: &Path) -> Result<GenerationReport, GeneratorError> {
        if !pyfile.is_file() {
            return Err(GeneratorError::NotFound(pyfile.to_path_buf()));
        }

        let module = extract_top_level_functions(pyfile)?;
        tracing::info!(
            "Found {} top-level function(s) in module '{}'",
            module.functions.len(),
            module.name
        );

        let prompts = build_prompts(&module, &self.options.prompt);
        let reply = self.model.complete(&prompts.to_messages()).await?;
        tracing::debug!("Model replied with {} bytes", reply.len());

        let code = ensure_imports_and_header(
            &module.name,
            &strip_code_fences(&reply),
            &module.functions,
        );

        let output_path = test_path_for(pyfile, &module.name);
        tokio::fs::write(&output_path, code)
            .await
            .map_err(|e| GeneratorError::Write {
                path: output_path.display().to_string(),
                source: e,
            })?;
        tracing::info!("Wrote {}", output_path.display());

        Ok(GenerationReport {
            module: module.name,
            output_path,
            function_count: module.functions.len(),
            pytest_exit_code: None,
        })
    }

    /// Run pytest on a generated file and record the exit code in `report`.
    pub async fn run_tests(&self, report: &mut GenerationReport) -> Result<i32, GeneratorError> {
        let code = PytestRunner::new(&self.options.pytest)
            .run(&report.output_path)
            .await?;
        report.pytest_exit_code = Some(code);
        Ok(code)
    }
}

/// `test_<module>.py` in the same directory as `pyfile`.
pub fn test_path_for(pyfile: &Path, module_name: &str) -> PathBuf {
    let file_name = format!("test_{}.py", module_name);
    match pyfile.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, Role};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Chat model that records the conversation and returns a fixed reply.
    struct FakeModel {
        reply: Result<String, u16>,
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl FakeModel {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for FakeModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
            self.seen.lock().unwrap().extend_from_slice(messages);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Status {
                    status: *status,
                    body: "denied".to_string(),
                    retry_after: None,
                }),
            }
        }
    }

    fn write_module(dir: &Path) -> PathBuf {
        let path = dir.join("calc.py");
        fs::write(
            &path,
            "def add(a, b):\n    \"\"\"Sum two numbers.\"\"\"\n    return a + b\n\ndef div(a, b):\n    return a / b\n",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_generate_writes_repaired_file() {
        let temp_dir = TempDir::new().unwrap();
        let pyfile = write_module(temp_dir.path());
        let model = FakeModel::replying(
            "```python\ndef test_add_success():\n    assert add(1, 2) == 3\n```",
        );
        let generator = TestGenerator::new(model.clone(), GeneratorOptions::default());

        let report = generator.generate(&pyfile).await.unwrap();

        assert_eq!(report.module, "calc");
        assert_eq!(report.function_count, 2);
        assert_eq!(report.output_path, temp_dir.path().join("test_calc.py"));
        assert_eq!(report.pytest_exit_code, None);

        let written = fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(
            written,
            "import pytest\nfrom calc import add, div\ndef test_add_success():\n    assert add(1, 2) == 3\n"
        );
    }

    #[tokio::test]
    async fn test_generate_sends_prompts_for_module() {
        let temp_dir = TempDir::new().unwrap();
        let pyfile = write_module(temp_dir.path());
        let model = FakeModel::replying("import pytest\nfrom calc import add, div\n");
        let generator = TestGenerator::new(model.clone(), GeneratorOptions::default());

        generator.generate(&pyfile).await.unwrap();

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].role, Role::System);
        assert_eq!(seen[1].role, Role::User);
        assert!(seen[1].content.contains("- add(a, b)\n- div(a, b)"));
        assert!(seen[1].content.contains("return a / b"));
    }

    #[tokio::test]
    async fn test_generate_overwrites_existing_test_file() {
        let temp_dir = TempDir::new().unwrap();
        let pyfile = write_module(temp_dir.path());
        fs::write(temp_dir.path().join("test_calc.py"), "stale").unwrap();
        let generator = TestGenerator::new(
            FakeModel::replying("import pytest\nimport calc\n"),
            GeneratorOptions::default(),
        );

        let report = generator.generate(&pyfile).await.unwrap();

        assert_eq!(
            fs::read_to_string(report.output_path).unwrap(),
            "import pytest\nimport calc\n"
        );
    }

    #[tokio::test]
    async fn test_generate_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let generator = TestGenerator::new(FakeModel::replying(""), GeneratorOptions::default());

        let err = generator
            .generate(&temp_dir.path().join("ghost.py"))
            .await
            .unwrap_err();

        assert!(matches!(err, GeneratorError::NotFound(_)));
        assert!(err.to_string().contains("ghost.py"));
    }

    #[tokio::test]
    async fn test_generate_model_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let pyfile = write_module(temp_dir.path());
        let generator = TestGenerator::new(FakeModel::failing(401), GeneratorOptions::default());

        let err = generator.generate(&pyfile).await.unwrap_err();

        assert!(matches!(err, GeneratorError::Llm(LlmError::Status { status: 401, .. })));
        assert!(!temp_dir.path().join("test_calc.py").exists());
    }

    #[tokio::test]
    async fn test_generate_parse_failure() {
        let temp_dir = TempDir::new().unwrap();
        let pyfile = temp_dir.path().join("broken.py");
        fs::write(&pyfile, "def broken(:\n").unwrap();
        let model = FakeModel::replying("import pytest\n");
        let generator = TestGenerator::new(model.clone(), GeneratorOptions::default());

        let err = generator.generate(&pyfile).await.unwrap_err();

        assert!(matches!(err, GeneratorError::Parse(_)));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tests_records_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let pyfile = write_module(temp_dir.path());
        let options = GeneratorOptions {
            pytest: PytestConfig {
                command: "sh".to_string(),
                args: vec!["-c".to_string(), "test -f \"$0\" && exit 5".to_string()],
            },
            ..GeneratorOptions::default()
        };
        let generator = TestGenerator::new(FakeModel::replying("import pytest\n"), options);

        let mut report = generator.generate(&pyfile).await.unwrap();
        let code = generator.run_tests(&mut report).await.unwrap();

        assert_eq!(code, 5);
        assert_eq!(report.pytest_exit_code, Some(5));
    }

    #[test]
    fn test_test_path_for() {
        assert_eq!(
            test_path_for(Path::new("pkg/calc.py"), "calc"),
            PathBuf::from("pkg/test_calc.py")
        );
        assert_eq!(
            test_path_for(Path::new("calc.py"), "calc"),
            PathBuf::from("test_calc.py")
        );
    }
}
