//! Single-shot authenticated HTTP execution over ureq.
//!
//! # Design
//! Status codes are never turned into errors by ureq itself: the request's
//! accepted-empty set is checked first, then `HttpResponse::into_envelope`
//! decides success. There are no retries.

use std::time::Duration;

use ureq::Agent;

use crate::error::ClientError;
use crate::http::{Body, Envelope, HttpRequest, HttpResponse};
use crate::session::{Credentials, Session};

pub struct Transport {
    agent: Agent,
    authorization: String,
}

impl Transport {
    pub fn new(credentials: &Credentials, timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            authorization: credentials.authorization(),
        }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::new(&session.credentials, session.timeout)
    }

    /// Perform the call and classify its outcome.
    pub fn call(&self, request: &HttpRequest) -> Result<Envelope, ClientError> {
        tracing::debug!(url = %request.url, body = request.body.kind(), "POST");

        let mut builder = self
            .agent
            .post(&request.url)
            .header("Authorization", self.authorization.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = match &request.body {
            Body::Empty => builder.send_empty(),
            Body::Form(params) => builder.send_form(params.form_pairs()),
            Body::Json(params) => {
                let json = params.to_json().to_string();
                builder.content_type("application/json").send(json.as_bytes())
            }
            Body::Raw(bytes) => builder.send(&bytes[..]),
        };
        let mut response = result.map_err(connection_error)?;

        let status = response.status().as_u16();
        tracing::debug!(status, "response");
        if request.accepts_empty(status) {
            tracing::info!(status, url = %request.url, "nothing to report");
            return Ok(Envelope::Empty);
        }

        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(connection_error)?;
        HttpResponse { status, body }.into_envelope()
    }
}

fn connection_error(err: ureq::Error) -> ClientError {
    ClientError::Connection(err.to_string())
}
