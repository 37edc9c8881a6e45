use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::ai::AiProvider;

const CLI_BINARY: &str = "claude";
const DEFAULT_MODEL: &str = "haiku";

/// Runs prompts through the locally installed `claude` CLI.
///
/// No API key involved; the CLI carries its own auth. This is the default
/// provider.
pub struct ClaudeCliProvider {
    model: String,
}

impl ClaudeCliProvider {
    pub fn new(model: String) -> Self {
        let model = if model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            model
        };
        Self { model }
    }

    /// PATH lookup, done once per process.
    fn cli_on_path() -> bool {
        static AVAILABLE: OnceLock<bool> = OnceLock::new();
        *AVAILABLE.get_or_init(|| {
            let path = std::env::var_os("PATH").unwrap_or_default();
            std::env::split_paths(&path).any(|dir| dir.join(CLI_BINARY).is_file())
        })
    }
}

#[async_trait]
impl AiProvider for ClaudeCliProvider {
    async fn generate(&self, prompt: &str, timeout_duration: Duration) -> Option<String> {
        if !self.is_available() {
            return None;
        }

        let mut cmd = Command::new(CLI_BINARY);
        cmd.arg("-p")
            .arg(prompt)
            .arg("--model")
            .arg(&self.model)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match timeout(timeout_duration, cmd.output()).await {
            Ok(Ok(output)) => {
                let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if output.status.success() && !text.is_empty() {
                    return Some(text);
                }
                if !output.status.success() {
                    tracing::debug!(
                        "claude CLI exited with {}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    );
                }
                None
            }
            Ok(Err(e)) => {
                tracing::debug!("claude CLI failed to run: {}", e);
                None
            }
            Err(_) => {
                tracing::debug!("claude CLI timed out after {:?}", timeout_duration);
                None
            }
        }
    }

    fn is_available(&self) -> bool {
        Self::cli_on_path()
    }

    fn name(&self) -> &'static str {
        "claude_cli"
    }
}
