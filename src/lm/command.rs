//! Local command transport.
//!
//! Invokes a user-configured command with the prompt on stdin and returns
//! stdout. The command can be any tool that accepts text input and produces
//! text output. The schema hint is appended to the prompt; inline media is
//! appended as a data URI since a text pipe has no attachment channel.
use super::{with_response_format, GenerateRequest, ModelClient, TransportError};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Model client backed by a local command.
#[derive(Debug, Clone)]
pub struct CommandClient {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandClient {
    /// Parse `command` with shell-words and resolve the program on `PATH`.
    pub fn new(command: &str) -> Result<Self, TransportError> {
        let mut argv =
            shell_words::split(command).map_err(|err| TransportError::InvalidCommand {
                command: command.to_string(),
                message: err.to_string(),
            })?;
        if argv.is_empty() {
            return Err(TransportError::EmptyCommand);
        }
        let program_name = argv.remove(0);
        let program =
            which::which(&program_name).map_err(|_| TransportError::CommandNotFound {
                program: program_name.clone(),
            })?;
        Ok(Self {
            program,
            args: argv,
        })
    }

    fn render_stdin(request: &GenerateRequest<'_>) -> String {
        let mut prompt = String::from(request.prompt.trim_end());
        if let Some(media) = request.media {
            prompt.push_str("\n\n# Attached Media\n");
            prompt.push_str(&media.to_data_uri());
        }
        with_response_format(&prompt, request.output_schema)
    }
}

impl ModelClient for CommandClient {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Option<String>, TransportError> {
        let stdin_text = Self::render_stdin(request);
        let start = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TransportError::Io {
                stage: "spawn",
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Commands that ignore stdin may exit before reading it all.
            if let Err(source) = stdin.write_all(stdin_text.as_bytes()) {
                if source.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(TransportError::Io {
                        stage: "write stdin",
                        source,
                    });
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|source| TransportError::Io {
                stage: "wait",
                source,
            })?;
        let elapsed_ms = start.elapsed().as_millis();

        tracing::info!(
            elapsed_ms,
            prompt_bytes = stdin_text.len(),
            response_bytes = output.stdout.len(),
            "lm invoke complete"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::CommandFailed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|_| TransportError::InvalidUtf8)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }
}
