//! Customer request intake from stdin.

use std::io::BufRead;

use thiserror::Error;

/// Longest accepted request, in characters.
pub const MAX_REQUEST_CHARS: usize = 5000;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read request: {0}")]
    Io(#[from] std::io::Error),

    #[error("Description too long ({chars} characters, max {MAX_REQUEST_CHARS})")]
    TooLong { chars: usize },
}

/// Read a request.
///
/// Interactive input ends at the first blank line or EOF; piped input is
/// read to EOF. The result is trimmed.
pub fn read_request(mut reader: impl BufRead, interactive: bool) -> Result<String, InputError> {
    if !interactive {
        let mut all = String::new();
        reader.read_to_string(&mut all)?;
        return Ok(all.trim().to_string());
    }

    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n").trim().to_string())
}

/// `Ok(None)` for an empty request, an error for an over-long one.
pub fn validate(request: &str) -> Result<Option<&str>, InputError> {
    let request = request.trim();
    if request.is_empty() {
        return Ok(None);
    }
    let chars = request.chars().count();
    if chars > MAX_REQUEST_CHARS {
        return Err(InputError::TooLong { chars });
    }
    Ok(Some(request))
}
