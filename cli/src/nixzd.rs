//! `nixzd`: cross-institution patient data lookup.

use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use hiex_core::nixzd::{
    CdaQuery, PatientQuery, DEFAULT_BASE_URL, DEFAULT_REQUEST_ORG, DEFAULT_SUBJECT,
};
use hiex_core::{
    invoke, CdaType, ClientError, Credentials, Directive, HttpRequest, NixzdClient, OutputTarget,
    PurposeOfUse, Session, Transport,
};

use crate::CommonArgs;

/// ICZ ISAC NIXZD Client - tools for calling services through the NIXZD REST API.
///
/// These tools are intended for testing purposes only.
#[derive(Parser, Debug)]
#[command(name = "nixzd", version)]
pub struct Cli {
    /// Service base URL
    #[arg(short, long, env = "NIXZD_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base: String,

    /// User login
    #[arg(short, long, env = "NIXZD_USER", default_value = "amis")]
    pub user: String,

    /// User password
    #[arg(short, long, env = "NIXZD_PASSWORD", default_value = "amis", hide_env_values = true)]
    pub password: String,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Test the NIXZD API availability
    #[command(name = "sayHello")]
    SayHello,
    /// Broadcast a patient information availability request to all peer nodes
    Exists(ExistsArgs),
    /// Get a patient HL7 CDA document
    Cda(CdaArgs),
}

#[derive(Args, Debug)]
pub struct PatientArgs {
    /// Patient ID - rodne cislo
    #[arg(long)]
    pub rc: String,

    /// Purpose of use of the required information [EMERGENCY, TREATMENT, PATIENT]
    #[arg(long, value_parser = PurposeOfUse::from_str)]
    pub purpose: PurposeOfUse,

    /// Name or ID of the requesting person or entity
    #[arg(long, default_value = DEFAULT_SUBJECT)]
    pub subject: String,

    /// Name or ID of the requesting healthcare provider
    #[arg(long, default_value = DEFAULT_REQUEST_ORG)]
    pub reqorgid: String,
}

impl PatientArgs {
    fn query(self) -> PatientQuery {
        PatientQuery {
            rc: self.rc,
            purpose: self.purpose,
            subject: self.subject,
            request_org: self.reqorgid,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExistsArgs {
    #[command(flatten)]
    pub patient: PatientArgs,
}

#[derive(Args, Debug)]
pub struct CdaArgs {
    /// Source healthcare provider ID
    #[arg(long)]
    pub srcid: String,

    #[command(flatten)]
    pub patient: PatientArgs,

    /// Type of the HL7 CDA document [L1, L3]
    #[arg(long, value_parser = CdaType::from_str, default_value = "L3")]
    pub cdatype: CdaType,

    /// ID of the HL7 CDA document
    #[arg(long)]
    pub id: String,

    /// OID of the HL7 CDA document
    #[arg(long)]
    pub oid: String,

    /// Write the document body to file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    pub fn session(&self) -> Session {
        Session::new(&self.base, Credentials::new(&self.user, &self.password))
            .with_pretty(self.common.pretty)
            .with_timeout(self.common.timeout())
    }
}

/// Build the request and rendering directive for a parsed command.
///
/// NIXZD answers with text or XML, so the pretty flag has no effect.
pub fn plan(client: &NixzdClient, command: Command) -> (HttpRequest, Directive) {
    match command {
        Command::SayHello => (client.build_say_hello(), Directive::PrintRaw),
        Command::Exists(args) => (client.build_exists(&args.patient.query()), Directive::PrintRaw),
        Command::Cda(args) => {
            let directive = match args.output {
                Some(path) => Directive::WriteBody {
                    target: OutputTarget::File(path),
                },
                None => Directive::PrintRaw,
            };
            let query = CdaQuery {
                source_id: args.srcid,
                patient: args.patient.query(),
                cda_type: args.cdatype,
                cda_id: args.id,
                cda_oid: args.oid,
            };
            (client.build_cda(&query), directive)
        }
    }
}

pub fn run(cli: Cli) -> Result<(), ClientError> {
    let session = cli.session();
    let client = NixzdClient::new(session.base_url());
    let (request, directive) = plan(&client, cli.command);
    let transport = Transport::for_session(&session);
    invoke(&transport, &request, &directive, &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("nixzd").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_apply() {
        let cli = parse(&["exists", "--rc", "1234567890", "--purpose", "emergency"]).unwrap();
        assert_eq!(cli.base, DEFAULT_BASE_URL);
        assert_eq!(cli.user, "amis");
        assert!(!cli.common.pretty);
        match cli.command {
            Command::Exists(args) => {
                assert_eq!(args.patient.purpose, PurposeOfUse::Emergency);
                assert_eq!(args.patient.subject, "Trpaslik");
                assert_eq!(args.patient.reqorgid, "Test HCP");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn invalid_purpose_is_a_usage_error() {
        let err = parse(&["exists", "--rc", "1", "--purpose", "CURIOSITY"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_cda_type_is_a_usage_error() {
        let err = parse(&[
            "cda", "--srcid", "1", "--rc", "2", "--purpose", "PATIENT", "--cdatype", "L2", "--id",
            "3", "--oid", "4",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn cda_directive_follows_output_option() {
        let client = NixzdClient::new(DEFAULT_BASE_URL);
        let base = [
            "cda", "--srcid", "1", "--rc", "2", "--purpose", "treatment", "--id", "3", "--oid", "4",
        ];

        let cli = parse(&base).unwrap();
        let (request, directive) = plan(&client, cli.command);
        assert_eq!(directive, Directive::PrintRaw);
        assert_eq!(request.body.params().unwrap().get("cdaType"), Some("L3"));

        let mut with_output = base.to_vec();
        with_output.extend(["-o", "doc.xml"]);
        let cli = parse(&with_output).unwrap();
        let (_, directive) = plan(&client, cli.command);
        assert_eq!(
            directive,
            Directive::WriteBody {
                target: OutputTarget::File(PathBuf::from("doc.xml"))
            }
        );
    }

    #[test]
    fn pretty_flag_does_not_change_text_rendering() {
        let cli = parse(&["--pretty", "sayHello"]).unwrap();
        assert!(cli.common.pretty);
        let client = NixzdClient::new(DEFAULT_BASE_URL);
        let (request, directive) = plan(&client, cli.command);
        assert!(request.url.ends_with("/sayHello"));
        assert_eq!(directive, Directive::PrintRaw);
    }
}
