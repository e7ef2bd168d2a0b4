//! Android root-shell clipboard strategies
//!
//! All methods shell out through `su -c`, since the HTTP daemon has no
//! clipboard focus of its own. Which method works depends on the Android
//! version and how deeply the vendor customized the system services, hence
//! the fallback chain.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::{ClipboardError, ReadStrategy, WriteStrategy};

/// Upper bound on a single `su` invocation, so a wedged shell cannot hang a
/// sync attempt.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read chain, highest priority first
pub fn default_readers() -> Vec<Box<dyn ReadStrategy>> {
    vec![
        Box::new(CmdClipboardRead),
        Box::new(ServiceCallRead),
        Box::new(BroadcastRead),
        Box::new(ContentProviderRead),
    ]
}

/// Default write chain, highest priority first
pub fn default_writers() -> Vec<Box<dyn WriteStrategy>> {
    vec![
        Box::new(CmdClipboardWrite),
        Box::new(ServiceCallWrite),
        Box::new(BroadcastWrite),
        Box::new(KeystrokeWrite),
    ]
}

/// Run a command under `su -c` and capture its output
async fn su_output(label: &str, command: &str) -> Result<std::process::Output, ClipboardError> {
    let run = Command::new("su")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .output();

    match timeout(COMMAND_TIMEOUT, run).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ClipboardError::Io(e)),
        Err(_) => Err(ClipboardError::Method(format!("{label} timed out"))),
    }
}

/// Run a command under `su -c`, feeding `input` through stdin
async fn su_with_stdin(label: &str, command: &str, input: &str) -> Result<(), ClipboardError> {
    let run = async {
        let mut child = Command::new("su")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await?;
            // Drop stdin to close the pipe so the command can finish.
        }

        child.wait().await
    };

    let status = match timeout(COMMAND_TIMEOUT, run).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => return Err(ClipboardError::Io(e)),
        Err(_) => return Err(ClipboardError::Method(format!("{label} timed out"))),
    };

    if status.success() {
        Ok(())
    } else {
        Err(ClipboardError::Method(format!(
            "{label} exited with {status}"
        )))
    }
}

/// Merge stdout and stderr the way a shell user would see them
fn merged_output(output: &std::process::Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// Whether command output carries an Android error dump instead of content
fn looks_like_error(output: &str) -> bool {
    output.contains("Error") || output.contains("Exception")
}

/// Recover clipboard text from `service call` parcel output
///
/// The output looks like `Result: Parcel(00000000 00000014 'text content'
/// 00000000)`. There is no documented format; the content is taken as the
/// substring between the first and last single quote on a line, and the
/// trimmed raw output is the fallback when no line carries a quoted span.
fn parse_parcel_output(output: &str) -> String {
    for line in output.lines() {
        if let Some(start) = line.find('\'') {
            let end = line.rfind('\'').unwrap_or(start);
            if end > start {
                return line[start + 1..end].to_string();
            }
        }
    }
    output.trim().to_string()
}

/// Escape quotes for interpolation into a single-quoted shell argument
fn escape_quotes(content: &str) -> String {
    content.replace('\'', "\\'").replace('"', "\\\"")
}

/// `cmd clipboard get-text` (Android 10+, broadest access)
pub struct CmdClipboardRead;

#[async_trait]
impl ReadStrategy for CmdClipboardRead {
    fn name(&self) -> &str {
        "cmd-clipboard"
    }

    async fn read(&self) -> Result<String, ClipboardError> {
        let output = su_output(self.name(), "cmd clipboard get-text").await?;
        if !output.status.success() {
            return Err(ClipboardError::Method(format!(
                "cmd clipboard exited with {}",
                output.status
            )));
        }

        let text = merged_output(&output);
        let content = text.trim();
        if looks_like_error(content) {
            return Err(ClipboardError::Method(
                "cmd clipboard reported an error".to_string(),
            ));
        }

        Ok(content.to_string())
    }
}

/// `service call clipboard` with heuristic parcel parsing
pub struct ServiceCallRead;

#[async_trait]
impl ReadStrategy for ServiceCallRead {
    fn name(&self) -> &str {
        "service-call"
    }

    async fn read(&self) -> Result<String, ClipboardError> {
        let output = su_output(
            self.name(),
            "service call clipboard 2 s16 com.android.shell",
        )
        .await?;
        if !output.status.success() {
            return Err(ClipboardError::Method(format!(
                "service call exited with {}",
                output.status
            )));
        }

        Ok(parse_parcel_output(&merged_output(&output)))
    }
}

/// Broadcast-intent retrieval
///
/// Reserved fallback slot: retrieval over a broadcast requires a receiver
/// app on the device and none is shipped, so this always fails. It stays in
/// the chain to keep the fallback order stable.
pub struct BroadcastRead;

#[async_trait]
impl ReadStrategy for BroadcastRead {
    fn name(&self) -> &str {
        "am-broadcast"
    }

    async fn read(&self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Method(
            "no broadcast receiver available".to_string(),
        ))
    }
}

/// `content query` against the clipboard provider, last resort
pub struct ContentProviderRead;

#[async_trait]
impl ReadStrategy for ContentProviderRead {
    fn name(&self) -> &str {
        "content-provider"
    }

    async fn read(&self) -> Result<String, ClipboardError> {
        let output = su_output(
            self.name(),
            "content query --uri content://clipboard/text",
        )
        .await?;
        if !output.status.success() {
            return Err(ClipboardError::Method(format!(
                "content query exited with {}",
                output.status
            )));
        }

        Ok(merged_output(&output).trim().to_string())
    }
}

/// `cmd clipboard set-text` with content piped through stdin
///
/// Stdin avoids the kernel argv length limit on large payloads.
pub struct CmdClipboardWrite;

#[async_trait]
impl WriteStrategy for CmdClipboardWrite {
    fn name(&self) -> &str {
        "cmd-clipboard"
    }

    async fn write(&self, content: &str) -> Result<(), ClipboardError> {
        su_with_stdin(self.name(), "cmd clipboard set-text", content).await
    }
}

/// `service call clipboard` write with the content as a shell argument
pub struct ServiceCallWrite;

#[async_trait]
impl WriteStrategy for ServiceCallWrite {
    fn name(&self) -> &str {
        "service-call"
    }

    async fn write(&self, content: &str) -> Result<(), ClipboardError> {
        let command = format!(
            "service call clipboard 1 i32 1 s16 com.android.shell s16 '{}'",
            escape_quotes(content)
        );
        let output = su_output(self.name(), &command).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Method(format!(
                "service call exited with {}",
                output.status
            )))
        }
    }
}

/// Broadcast-intent delivery to a clipper-style receiver
pub struct BroadcastWrite;

#[async_trait]
impl WriteStrategy for BroadcastWrite {
    fn name(&self) -> &str {
        "am-broadcast"
    }

    async fn write(&self, content: &str) -> Result<(), ClipboardError> {
        let command = format!(
            "am broadcast -a clipper.set -e text '{}'",
            content.replace('\'', "\\'")
        );
        let output = su_output(self.name(), &command).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Method(format!(
                "am broadcast exited with {}",
                output.status
            )))
        }
    }
}

/// Literal keystroke injection via `input text`, last resort
///
/// Cannot express newlines, carriage returns, or tabs; such content is
/// rejected before any command is spawned.
pub struct KeystrokeWrite;

#[async_trait]
impl WriteStrategy for KeystrokeWrite {
    fn name(&self) -> &str {
        "input-text"
    }

    async fn write(&self, content: &str) -> Result<(), ClipboardError> {
        if content
            .chars()
            .any(|c| matches!(c, '\n' | '\r' | '\t'))
        {
            return Err(ClipboardError::UnsupportedContent(
                "input text cannot express newlines or tabs".to_string(),
            ));
        }

        let command = format!("input text '{content}'");
        let output = su_output(self.name(), &command).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Method(format!(
                "input text exited with {}",
                output.status
            )))
        }
    }
}
