//! Request builders for the NIXZD cross-institution patient lookup gateway.
//!
//! # Design
//! `NixzdClient` holds only the base URL. Each operation is a `build_*`
//! method producing an `HttpRequest`; the caller hands it to `Transport`.
//! All three endpoints take form-encoded parameters and answer with
//! text or XML.

use crate::encode::{encode_subject, request_id, CdaType, PurposeOfUse};
use crate::http::{Body, HttpRequest, Params};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/nixzd/v11";
pub const DEFAULT_SUBJECT: &str = "Trpaslik";
pub const DEFAULT_REQUEST_ORG: &str = "Test HCP";

/// Patient identity and access justification shared by `exists` and `cda`.
#[derive(Debug, Clone)]
pub struct PatientQuery {
    /// Birth number (rodne cislo).
    pub rc: String,
    pub purpose: PurposeOfUse,
    /// Requesting person or entity; sent base64-encoded.
    pub subject: String,
    pub request_org: String,
}

impl PatientQuery {
    pub fn new(rc: impl Into<String>, purpose: PurposeOfUse) -> Self {
        Self {
            rc: rc.into(),
            purpose,
            subject: DEFAULT_SUBJECT.to_string(),
            request_org: DEFAULT_REQUEST_ORG.to_string(),
        }
    }

    fn fill(&self, params: &mut Params) {
        params
            .insert("idType", "RC")
            .insert("idValue", self.rc.as_str())
            .insert("purposeOfUse", self.purpose.as_str())
            .insert("subjectNameId", encode_subject(&self.subject))
            .insert("requestOrgId", self.request_org.as_str());
    }
}

/// Identification of a single CDA document held by a peer node.
#[derive(Debug, Clone)]
pub struct CdaQuery {
    pub source_id: String,
    pub patient: PatientQuery,
    pub cda_type: CdaType,
    pub cda_id: String,
    pub cda_oid: String,
}

#[derive(Debug, Clone)]
pub struct NixzdClient {
    base_url: String,
}

impl NixzdClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.base_url)
    }

    /// Liveness probe.
    pub fn build_say_hello(&self) -> HttpRequest {
        HttpRequest::post(self.url("/sayHello"), Body::Form(Params::new()))
    }

    /// Broadcast an availability query for the patient to all peer nodes.
    pub fn build_exists(&self, query: &PatientQuery) -> HttpRequest {
        let mut params = Params::new();
        query.fill(&mut params);
        params.insert("requestId", request_id());
        HttpRequest::post(self.url("/getPsExists.xml"), Body::Form(params))
    }

    pub fn build_cda(&self, query: &CdaQuery) -> HttpRequest {
        let mut params = Params::new();
        params.insert("sourceIdentifier", query.source_id.as_str());
        query.patient.fill(&mut params);
        params
            .insert("cdaType", query.cda_type.as_str())
            .insert("cdaId", query.cda_id.as_str())
            .insert("cdaOid", query.cda_oid.as_str())
            .insert("requestId", request_id());
        HttpRequest::post(self.url("/getPs.cda"), Body::Form(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn client() -> NixzdClient {
        NixzdClient::new("http://localhost:8080/api/nixzd/v11/")
    }

    fn params(req: &HttpRequest) -> &Params {
        match &req.body {
            Body::Form(params) => params,
            other => panic!("expected form body, got {}", other.kind()),
        }
    }

    #[test]
    fn say_hello_has_no_parameters() {
        let req = client().build_say_hello();
        assert_eq!(req.url, "http://localhost:8080/api/nixzd/v11/sayHello");
        assert!(params(&req).is_empty());
        assert!(req.accept_empty.is_empty());
    }

    #[test]
    fn exists_uses_defaults_and_fresh_request_id() {
        let query = PatientQuery::new("1234567890", PurposeOfUse::Emergency);
        let first = client().build_exists(&query);
        let second = client().build_exists(&query);

        assert_eq!(first.url, "http://localhost:8080/api/nixzd/v11/getPsExists.xml");
        let p = params(&first);
        assert_eq!(
            p.keys().collect::<Vec<_>>(),
            vec![
                "idType",
                "idValue",
                "purposeOfUse",
                "subjectNameId",
                "requestOrgId",
                "requestId"
            ]
        );
        assert_eq!(p.get("idType"), Some("RC"));
        assert_eq!(p.get("idValue"), Some("1234567890"));
        assert_eq!(p.get("purposeOfUse"), Some("EMERGENCY"));
        assert_eq!(p.get("requestOrgId"), Some("Test HCP"));

        let subject = STANDARD.decode(p.get("subjectNameId").unwrap()).unwrap();
        assert_eq!(subject, b"Trpaslik");

        assert_ne!(p.get("requestId"), params(&second).get("requestId"));
    }

    #[test]
    fn exists_encodes_subject_override() {
        let mut query = PatientQuery::new("1234567890", PurposeOfUse::Treatment);
        query.subject = "MUDr. Dvořák".to_string();
        query.request_org = "Nemocnice Na Homolce".to_string();
        let req = client().build_exists(&query);
        let p = params(&req);
        let subject = STANDARD.decode(p.get("subjectNameId").unwrap()).unwrap();
        assert_eq!(String::from_utf8(subject).unwrap(), "MUDr. Dvořák");
        assert_eq!(p.get("requestOrgId"), Some("Nemocnice Na Homolce"));
        assert_eq!(p.get("purposeOfUse"), Some("TREATMENT"));
    }

    #[test]
    fn cda_carries_document_identity() {
        let query = CdaQuery {
            source_id: "27283933".to_string(),
            patient: PatientQuery::new("1234567890", PurposeOfUse::Patient),
            cda_type: CdaType::L1,
            cda_id: "DOC-1".to_string(),
            cda_oid: "1.2.203.1".to_string(),
        };
        let req = client().build_cda(&query);
        assert_eq!(req.url, "http://localhost:8080/api/nixzd/v11/getPs.cda");
        let p = params(&req);
        assert_eq!(p.len(), 10);
        assert_eq!(p.get("sourceIdentifier"), Some("27283933"));
        assert_eq!(p.get("cdaType"), Some("L1"));
        assert_eq!(p.get("cdaId"), Some("DOC-1"));
        assert_eq!(p.get("cdaOid"), Some("1.2.203.1"));
        assert_eq!(p.get("purposeOfUse"), Some("PATIENT"));
        assert!(p.get("requestId").is_some());
    }
}
