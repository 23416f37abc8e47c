//! External process execution.
//!
//! Every bsub, bjobs and local payload invocation goes through
//! [`CommandRunner`], so queue logic can be exercised against a scripted
//! runner without spawning anything.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;

use crate::error::{SchedError, SchedResult};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a token list whose first element is the program.
    pub fn from_tokens(tokens: &[String]) -> SchedResult<Self> {
        let (program, args) = tokens
            .split_first()
            .ok_or_else(|| SchedError::InvalidJob("command line is empty".to_string()))?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}{}", self.stdout, self.stderr)
        }
    }

    /// Turn a nonzero exit into [`SchedError::CommandFailed`].
    pub fn check(self, command: &CommandLine) -> SchedResult<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(SchedError::CommandFailed {
            command: command.to_string(),
            code: self.code.unwrap_or(-1),
            output: self.combined(),
        })
    }
}

/// Runs external commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion with stdout and stderr captured.
    async fn output(
        &self,
        command: &CommandLine,
        timeout: Option<Duration>,
    ) -> SchedResult<CommandOutput>;

    /// Run to completion, echoing output to this process as it arrives
    /// while also capturing it.
    async fn run_live(&self, command: &CommandLine) -> SchedResult<CommandOutput>;
}

/// Runner backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn build(command: &CommandLine) -> Command {
        let mut cmd = Command::new(command.program());
        cmd.args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn launch_error(command: &CommandLine, e: std::io::Error) -> SchedError {
        SchedError::CommandLaunch {
            command: command.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn output(
        &self,
        command: &CommandLine,
        timeout: Option<Duration>,
    ) -> SchedResult<CommandOutput> {
        tracing::debug!("Running command `{}`", command);
        let pending = Self::build(command).output();

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                SchedError::Timeout(format!("`{command}` timed out after {limit:?}"))
            })?,
            None => pending.await,
        }
        .map_err(|e| Self::launch_error(command, e))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn run_live(&self, command: &CommandLine) -> SchedResult<CommandOutput> {
        tracing::debug!("Running command `{}` locally", command);
        let mut child = Self::build(command)
            .spawn()
            .map_err(|e| Self::launch_error(command, e))?;

        let (stdout, stderr) = tokio::try_join!(
            echo_lines(child.stdout.take(), tokio::io::stdout()),
            echo_lines(child.stderr.take(), tokio::io::stderr()),
        )?;
        let status = child.wait().await?;

        Ok(CommandOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Copy `source` line by line into `sink`, returning everything copied.
async fn echo_lines<R, W>(source: Option<R>, mut sink: W) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut captured = String::new();
    let Some(source) = source else {
        return Ok(captured);
    };

    let mut lines = BufReader::new(source).lines();
    while let Some(line) = lines.next_line().await? {
        sink.write_all(line.as_bytes()).await?;
        sink.write_all(b"\n").await?;
        captured.push_str(&line);
        captured.push('\n');
    }
    sink.flush().await?;
    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_display() {
        let command = CommandLine::new("bsub")
            .args(["-n", "4"])
            .arg("-oo")
            .arg("/tmp/my log.txt")
            .arg("");
        assert_eq!(command.to_string(), r#"bsub -n 4 -oo "/tmp/my log.txt" """#);
    }

    #[test]
    fn test_from_tokens() {
        let tokens = vec!["sleep".to_string(), "20".to_string()];
        let command = CommandLine::from_tokens(&tokens).unwrap();
        assert_eq!(command.program(), "sleep");
        assert_eq!(command.arguments(), ["20".to_string()]);

        assert!(matches!(
            CommandLine::from_tokens(&[]),
            Err(SchedError::InvalidJob(_))
        ));
    }

    #[test]
    fn test_check_nonzero_exit() {
        let command = CommandLine::new("bjobs").arg("17");
        let output = CommandOutput {
            code: Some(255),
            stdout: String::new(),
            stderr: "Job <17> is not found\n".to_string(),
        };
        match output.check(&command) {
            Err(SchedError::CommandFailed {
                command,
                code,
                output,
            }) => {
                assert_eq!(command, "bjobs 17");
                assert_eq!(code, 255);
                assert!(output.contains("is not found"));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }

        assert!(CommandOutput::ok("fine").check(&command).is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_output() {
        let command = CommandLine::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner.output(&command, None).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_live() {
        let command = CommandLine::new("sh").args(["-c", "echo one; echo two"]);
        let output = SystemRunner.run_live(&command).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "one\ntwo\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_timeout_kills_slow_command() {
        let command = CommandLine::new("sh").args(["-c", "sleep 3"]);
        let start = std::time::Instant::now();
        let result = SystemRunner
            .output(&command, Some(Duration::from_millis(200)))
            .await;

        match result {
            Err(SchedError::Timeout(message)) => {
                assert!(message.contains("sh -c \"sleep 3\""));
                assert!(message.ends_with("timed out after 200ms"));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_system_runner_missing_program() {
        let command = CommandLine::new("/nonexistent/bqueue-test-program");
        let result = SystemRunner.output(&command, None).await;
        assert!(matches!(result, Err(SchedError::CommandLaunch { .. })));
    }
}
