//! Blocking execution of external tools
//!
//! Every collaborator the verifier relies on (`svn`, `svn-ls-tree`, `git`,
//! an optional checksum program) is run through [`run`]. Calls block until
//! the child exits and have no timeout.

use crate::error::{Result, VerifyError};
use std::io::ErrorKind;
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// Run a command to completion and return its stdout
///
/// A non-zero exit becomes [`VerifyError::ExternalTool`] carrying the
/// command line and the captured stdout followed by stderr.
pub fn run(cmd: &mut Command) -> Result<Vec<u8>> {
    let rendered = render(cmd);
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!("Running {}", rendered);

    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => VerifyError::InvalidConfiguration(format!(
                "{} not found: {}",
                program, e
            )),
            _ => VerifyError::Io(e),
        })?;

    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(VerifyError::ExternalTool {
            command: rendered,
            status: output.status,
            output: combined,
        });
    }

    trace!("{} wrote {} bytes", rendered, output.stdout.len());
    Ok(output.stdout)
}

/// Run a command and decode its stdout as text
///
/// Invalid UTF-8 is replaced rather than rejected; listings are compared
/// line by line and a replacement character still compares consistently.
pub fn run_text(cmd: &mut Command) -> Result<String> {
    let stdout = run(cmd)?;
    Ok(match String::from_utf8(stdout) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Render a command as a shell-like string for logs and errors
pub fn render(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}
