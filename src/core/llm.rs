//! Text-generation capability.
//!
//! The pipeline only ever sees `dyn TextGenerator`: prompt and model name in,
//! text out. Swapping providers (or a deterministic stub in tests) never
//! touches retrieval code.

use crate::core::config::GenerationSettings;
use crate::core::error::HybridRagError;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, model: &str) -> Result<String, HybridRagError>;
}

/// Runs an external program per call: the prompt goes to stdin, the
/// completion is read from stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self::new(settings.command.clone(), settings.args.clone())
    }

    fn resolved_args(&self, model: &str) -> Vec<String> {
        self.args.iter().map(|a| a.replace("{model}", model)).collect()
    }
}

impl TextGenerator for CommandGenerator {
    fn generate(&self, prompt: &str, model: &str) -> Result<String, HybridRagError> {
        let args = self.resolved_args(model);
        debug!(program = %self.program, ?args, prompt_chars = prompt.len(), "spawning generator");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                HybridRagError::GenerationFailure(format!("failed to spawn {}: {}", self.program, e))
            })?;

        // stdout is drained while the prompt is still being written; a child
        // that echoes as it reads would otherwise fill both pipes.
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = prompt.to_owned();
            thread::spawn(move || stdin.write_all(prompt.as_bytes()))
        });

        let output = child.wait_with_output().map_err(|e| {
            HybridRagError::GenerationFailure(format!("{} did not complete: {}", self.program, e))
        })?;

        if let Some(writer) = writer {
            let written = writer
                .join()
                .map_err(|_| HybridRagError::GenerationFailure("prompt writer panicked".to_string()))?;
            // A child may exit without reading all of stdin.
            if let Err(e) = written {
                if e.kind() != io::ErrorKind::BrokenPipe {
                    return Err(HybridRagError::GenerationFailure(format!(
                        "failed to write prompt: {}",
                        e
                    )));
                }
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr_preview: String = stderr.chars().take(500).collect();
            return Err(HybridRagError::GenerationFailure(format!(
                "{} exited with {}: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stderr_preview.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
