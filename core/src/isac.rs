//! Request builders for the ISAC clinical communication node.
//!
//! Every ISAC operation forwards the caller's display name as `username`,
//! which may be absent.

use crate::encode::IsoDate;
use crate::http::{Body, HttpRequest, Params};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/g3/";
pub const DEFAULT_SURVEY_FROM: &str = "2000-01-01";
pub const DEFAULT_BODY_TYPE: &str = "text/plain";
pub const DEFAULT_CONTENT_TYPE: &str = "application/xml";

/// Status "no pending document" returned by the inbox download endpoint.
pub const INBOX_EMPTY_STATUS: u16 = 404;

/// Parameterless information endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeInfo {
    /// Operational information about the communication node application.
    App,
    Config,
    Status,
    /// Provider detail as a source for editing.
    Provider,
    /// Production system detail.
    ProdSys,
    /// Bed availability survey.
    BedFund,
}

impl NodeInfo {
    pub fn path(self) -> &'static str {
        match self {
            NodeInfo::App => "/app.json",
            NodeInfo::Config => "/nodeconfig.json",
            NodeInfo::Status => "/nodestatus.json",
            NodeInfo::Provider => "/confedit/provider.json",
            NodeInfo::ProdSys => "/prodsys/get.json",
            NodeInfo::BedFund => "/beds.json",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SurveyQuery {
    pub rc: String,
    pub lastname: Option<String>,
    pub from: Option<IsoDate>,
    pub to: Option<IsoDate>,
}

#[derive(Debug, Clone)]
pub struct HandoverQuery {
    pub patient_oid: Option<String>,
    pub provider_oid: String,
    pub document_oid: String,
    /// Required MIME type of the handed-over document.
    pub body_type: String,
}

#[derive(Debug, Clone)]
pub struct IsacClient {
    base_url: String,
    username: Option<String>,
}

impl IsacClient {
    pub fn new(base_url: &str, username: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.base_url)
    }

    fn with_username(&self, mut params: Params) -> Params {
        params.insert_opt("username", self.username.clone());
        params
    }

    pub fn build_info(&self, info: NodeInfo) -> HttpRequest {
        let params = self.with_username(Params::new());
        HttpRequest::post(self.url(info.path()), Body::Form(params))
    }

    /// Patient emergency information summary.
    pub fn build_patient_summary(
        &self,
        rc: &str,
        firstname: Option<String>,
        lastname: Option<String>,
    ) -> HttpRequest {
        let mut params = Params::new();
        params
            .insert("rc", rc)
            .insert_opt("firstname", firstname)
            .insert_opt("lastname", lastname);
        HttpRequest::post(self.url("/ec.json"), Body::Form(self.with_username(params)))
    }

    /// Documentation of a single clinical event at a provider.
    pub fn build_document_view(&self, provider_oid: &str, event_id: &str) -> HttpRequest {
        let mut params = Params::new();
        params.insert("icz", provider_oid).insert("eventId", event_id);
        HttpRequest::post(
            self.url("/DocumentView.json"),
            Body::Form(self.with_username(params)),
        )
    }

    pub fn build_survey(&self, query: &SurveyQuery) -> HttpRequest {
        let mut params = Params::new();
        params
            .insert("rc", query.rc.as_str())
            .insert_opt("lastname", query.lastname.clone())
            .insert_opt("from", query.from.as_ref().map(|d| d.to_string()))
            .insert_opt("to", query.to.as_ref().map(|d| d.to_string()));
        HttpRequest::post(self.url("/survey.json"), Body::Json(self.with_username(params)))
    }

    pub fn build_handover(&self, query: &HandoverQuery) -> HttpRequest {
        let mut params = Params::new();
        params
            .insert_opt("patoid", query.patient_oid.clone())
            .insert("orgoid", query.provider_oid.as_str())
            .insert("docoid", query.document_oid.as_str())
            .insert("bodytype", query.body_type.as_str());
        HttpRequest::post(
            self.url("/handover.json"),
            Body::Json(self.with_username(params)),
        )
    }

    /// Send a document to another provider through the message store.
    ///
    /// The payload goes out verbatim; `username` is not part of this call.
    pub fn build_send_document(&self, document: Vec<u8>, content_type: &str) -> HttpRequest {
        HttpRequest::post(self.url("/msgstore/senddoc.json"), Body::Raw(document))
            .with_header("Content-Type", content_type)
    }

    /// Download the next pending inbound document, if any.
    pub fn build_receive_document(&self) -> HttpRequest {
        let mut req = HttpRequest::post(self.url("/msgstore/download"), Body::Empty);
        req.accept_empty = vec![INBOX_EMPTY_STATUS];
        req
    }

    /// Rescue notifications filtered by period and record status.
    pub fn build_rescue_notifications(
        &self,
        period: Option<String>,
        status: Option<String>,
    ) -> HttpRequest {
        let mut params = Params::new();
        params.insert_opt("period", period).insert_opt("status", status);
        HttpRequest::post(
            self.url("/rescnotif.json"),
            Body::Form(self.with_username(params)),
        )
    }
}
