//! Response rendering.
//!
//! # Design
//! Each command picks its `Directive` when it is defined; the response
//! content never changes how it is presented. Textual output goes to the
//! writer passed in by the caller (stdout in the binaries), document bodies
//! go to an `OutputTarget`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::ClientError;
use crate::http::Envelope;

/// Where a document body is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl From<Option<PathBuf>> for OutputTarget {
    fn from(path: Option<PathBuf>) -> Self {
        path.map(OutputTarget::File).unwrap_or(OutputTarget::Stdout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Print the body unchanged.
    PrintRaw,
    /// Print the body, re-indented as JSON when `enabled`.
    PrintPretty { enabled: bool },
    /// Write the whole body verbatim.
    WriteBody { target: OutputTarget },
    /// Write the content of a JSON field verbatim.
    ExtractField {
        field: &'static str,
        target: OutputTarget,
    },
    /// Write the base64-decoded content of a JSON field.
    DecodeField {
        field: &'static str,
        target: OutputTarget,
    },
}

/// Present `envelope` according to `directive`.
///
/// An empty envelope renders nothing whatever the directive. A successful
/// response with a zero-length body prints a bare newline for the print
/// directives and never creates an output file.
pub fn render<W: Write>(
    directive: &Directive,
    envelope: &Envelope,
    stdout: &mut W,
) -> Result<(), ClientError> {
    let Some(body) = envelope.bytes() else {
        return Ok(());
    };
    if body.is_empty() {
        tracing::debug!("response body is empty");
        if let Directive::PrintRaw | Directive::PrintPretty { .. } = directive {
            stdout.write_all(b"\n")?;
        }
        return Ok(());
    }

    match directive {
        Directive::PrintRaw | Directive::PrintPretty { enabled: false } => {
            stdout.write_all(body)?;
            stdout.write_all(b"\n")?;
        }
        Directive::PrintPretty { enabled: true } => {
            let value = parse_json(body)?;
            stdout.write_all(&pretty(&value)?)?;
            stdout.write_all(b"\n")?;
        }
        Directive::WriteBody { target } => write_to(target, body, stdout)?,
        Directive::ExtractField { field, target } => {
            let value = parse_json(body)?;
            match value.get(*field) {
                Some(Value::String(text)) => write_to(target, text.as_bytes(), stdout)?,
                Some(other) => write_to(target, other.to_string().as_bytes(), stdout)?,
                None => tracing::warn!(
                    field = *field,
                    "response has no document field, nothing written"
                ),
            }
        }
        Directive::DecodeField { field, target } => {
            let value = parse_json(body)?;
            match value.get(*field) {
                Some(Value::String(encoded)) => {
                    let bytes = STANDARD
                        .decode(encoded.trim())
                        .map_err(|e| ClientError::Decode {
                            field: *field,
                            reason: e.to_string(),
                        })?;
                    write_to(target, &bytes, stdout)?;
                }
                Some(_) => {
                    return Err(ClientError::MalformedResponse(format!(
                        "field '{field}' is not a string"
                    )))
                }
                None => tracing::warn!(
                    field = *field,
                    "response has no document field, nothing written"
                ),
            }
        }
    }
    Ok(())
}

fn parse_json(body: &[u8]) -> Result<Value, ClientError> {
    serde_json::from_slice(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}

/// Four-space indented JSON, keys in the server's order.
pub fn pretty(value: &Value) -> Result<Vec<u8>, ClientError> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
    Ok(out)
}

fn write_to<W: Write>(
    target: &OutputTarget,
    bytes: &[u8],
    stdout: &mut W,
) -> Result<(), ClientError> {
    match target {
        OutputTarget::Stdout => {
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
        OutputTarget::File(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            file.write_all(bytes)?;
            file.flush()?;
            tracing::debug!(path = %path.display(), len = bytes.len(), "document written");
        }
    }
    Ok(())
}
