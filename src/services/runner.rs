//! pytest execution

use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use crate::config::PytestConfig;

/// Errors raised while running pytest
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

/// Runs pytest on a generated test file, streaming its output to the terminal.
#[derive(Debug, Clone)]
pub struct PytestRunner {
    command: String,
    args: Vec<String>,
}

impl PytestRunner {
    pub fn new(config: &PytestConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }

    /// Run `<command> <args...> <test_file>` and return its exit code.
    ///
    /// A process killed by a signal reports `-1`.
    pub async fn run(&self, test_file: &Path) -> Result<i32, RunnerError> {
        tracing::info!(
            "Running {} {} {}",
            self.command,
            self.args.join(" "),
            test_file.display()
        );

        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(test_file)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| RunnerError::Spawn {
                command: self.command.clone(),
                source: e,
            })?;

        let code = status.code().unwrap_or(-1);
        tracing::info!("pytest exited with code {}", code);
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(command: &str, args: &[&str]) -> PytestRunner {
        PytestRunner::new(&PytestConfig {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_returns_exit_code() {
        let ok = runner("sh", &["-c", "exit 0"]);
        assert_eq!(ok.run(Path::new("test_x.py")).await.unwrap(), 0);

        let failing = runner("sh", &["-c", "exit 3"]);
        assert_eq!(failing.run(Path::new("test_x.py")).await.unwrap(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_passes_test_file_last() {
        let check = runner("sh", &["-c", "test \"$0\" = test_calc.py"]);
        assert_eq!(check.run(Path::new("test_calc.py")).await.unwrap(), 0);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_run_shares_stdin_with_caller() {
        let check = runner(
            "sh",
            &["-c", "[ \"$(readlink /proc/self/fd/0)\" = \"$(readlink /proc/$PPID/fd/0)\" ]"],
        );
        assert_eq!(check.run(Path::new("test_x.py")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_missing_command() {
        let missing = runner("pytestgen-no-such-command", &[]);
        let err = missing.run(Path::new("test_x.py")).await.unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
        assert!(err.to_string().contains("pytestgen-no-such-command"));
    }
}
