//! Client core for the NIXZD and ISAC health-information-exchange gateways.
//!
//! # Overview
//! Every command runs the same pipeline: a `build_*` method on
//! `NixzdClient` / `IsacClient` encodes the parameters into an
//! `HttpRequest`, `Transport` performs one authenticated POST, and `render`
//! presents the response according to a `Directive` fixed by the command.
//!
//! # Design
//! - Request building is pure data and needs no network to test.
//! - `Session` is constructed once per process from the command line and
//!   passed by reference; there is no global state.
//! - Failures are `ClientError` values carried up to the binary, which turns
//!   them into an exit code.

pub mod encode;
pub mod error;
pub mod http;
pub mod isac;
pub mod nixzd;
pub mod render;
pub mod session;
pub mod transport;

use std::io::Write;

pub use encode::{CdaType, IsoDate, PurposeOfUse};
pub use error::{ClientError, UsageError};
pub use http::{Body, Envelope, HttpRequest, HttpResponse, Params};
pub use isac::IsacClient;
pub use nixzd::NixzdClient;
pub use render::{render, Directive, OutputTarget};
pub use session::{Credentials, Session};
pub use transport::Transport;

/// Send `request` and render the outcome with `directive`.
pub fn invoke<W: Write>(
    transport: &Transport,
    request: &HttpRequest,
    directive: &Directive,
    stdout: &mut W,
) -> Result<(), ClientError> {
    let envelope = transport.call(request)?;
    render(directive, &envelope, stdout)
}
