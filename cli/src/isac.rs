//! `isac`: clinical communication node.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use hiex_core::isac::{
    HandoverQuery, NodeInfo, SurveyQuery, DEFAULT_BASE_URL, DEFAULT_BODY_TYPE,
    DEFAULT_CONTENT_TYPE, DEFAULT_SURVEY_FROM,
};
use hiex_core::{
    invoke, ClientError, Credentials, Directive, HttpRequest, IsacClient, IsoDate, OutputTarget,
    Session, Transport,
};

use crate::CommonArgs;

/// ICZ ISAC Client - tools for calling services through the REST API.
///
/// These tools are intended for testing purposes only.
#[derive(Parser, Debug)]
#[command(name = "isac", version)]
pub struct Cli {
    /// Service base URL
    #[arg(short, long, env = "ISAC_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base: String,

    /// User login
    #[arg(short, long, env = "ISAC_USER", default_value = "amis")]
    pub user: String,

    /// User password
    #[arg(short, long, env = "ISAC_PASSWORD", default_value = "amis", hide_env_values = true)]
    pub password: String,

    /// Full user name
    #[arg(long, env = "ISAC_USERNAME")]
    pub username: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Communication node operational information
    Info,
    /// Communication node configuration information
    Config,
    /// Communication node status information
    Status,
    /// Healthcare provider detail information as a source for editing
    Provider,
    /// Production system detail information
    Prodsys,
    /// Patient emergency information summary
    Patsum(PatsumArgs),
    /// Patient clinical event documentation view
    Docview(DocviewArgs),
    /// Patient documentation survey
    Survey(SurveyArgs),
    /// Patient documentation handover
    Handover(HandoverArgs),
    /// Send a document to another healthcare provider
    Senddoc(SenddocArgs),
    /// Receive a document from another healthcare provider
    Recvdoc(RecvdocArgs),
    /// Bed fund survey
    Bedfund,
    /// Rescue notifications survey
    Rescnotif(RescnotifArgs),
}

#[derive(Args, Debug)]
pub struct PatsumArgs {
    /// Patient ID - rodne cislo
    #[arg(long)]
    pub id: String,
    /// Patient first name
    #[arg(long)]
    pub firstname: Option<String>,
    /// Patient last name
    #[arg(long)]
    pub lastname: Option<String>,
}

#[derive(Args, Debug)]
pub struct DocviewArgs {
    /// Healthcare provider OID
    #[arg(long)]
    pub provoid: String,
    /// Clinical event ID
    #[arg(long)]
    pub eventid: String,
}

#[derive(Args, Debug)]
pub struct SurveyArgs {
    /// Patient ID - rodne cislo
    #[arg(long)]
    pub rc: String,
    /// Patient surname
    #[arg(long)]
    pub lastname: Option<String>,
    /// Start date for searching documents (YYYY-MM-DD)
    #[arg(long, value_parser = IsoDate::from_str, default_value = DEFAULT_SURVEY_FROM)]
    pub from: IsoDate,
    /// End date for searching documents (YYYY-MM-DD)
    #[arg(long, value_parser = IsoDate::from_str)]
    pub to: Option<IsoDate>,
}

#[derive(Args, Debug)]
pub struct HandoverArgs {
    /// Patient OID
    #[arg(long)]
    pub patoid: Option<String>,
    /// Healthcare provider OID
    #[arg(long)]
    pub orgoid: String,
    /// Document OID
    #[arg(long)]
    pub docoid: String,
    /// Required MIME type of the document
    #[arg(long, default_value = DEFAULT_BODY_TYPE)]
    pub bodytype: String,
    /// Write the document body to file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Write the body as received, without base64 decoding
    #[arg(long, requires = "output")]
    pub encoded: bool,
}

#[derive(Args, Debug)]
pub struct SenddocArgs {
    /// Document content type
    #[arg(long, default_value = DEFAULT_CONTENT_TYPE)]
    pub contype: String,
    /// Read the document body from file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RecvdocArgs {
    /// Write the document body to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RescnotifArgs {
    /// Date interval for records [dd.mm.yyyy - dd.mm.yyyy]
    #[arg(long)]
    pub period: Option<String>,
    /// Record status to select: A B C F P or a combination
    #[arg(long)]
    pub status: Option<String>,
}

impl Cli {
    pub fn session(&self) -> Session {
        Session::new(&self.base, Credentials::new(&self.user, &self.password))
            .with_username(self.username.clone())
            .with_pretty(self.common.pretty)
            .with_timeout(self.common.timeout())
    }
}

fn read_document(input: Option<PathBuf>) -> Result<Vec<u8>, ClientError> {
    match input {
        Some(path) => Ok(fs::read(path)?),
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Build the request and rendering directive for a parsed command.
///
/// Fails only when a document to send cannot be read.
pub fn plan(
    client: &IsacClient,
    session: &Session,
    command: Command,
) -> Result<(HttpRequest, Directive), ClientError> {
    let pretty = Directive::PrintPretty {
        enabled: session.pretty,
    };
    let planned = match command {
        Command::Info => (client.build_info(NodeInfo::App), pretty),
        Command::Config => (client.build_info(NodeInfo::Config), pretty),
        Command::Status => (client.build_info(NodeInfo::Status), pretty),
        Command::Provider => (client.build_info(NodeInfo::Provider), pretty),
        Command::Prodsys => (client.build_info(NodeInfo::ProdSys), pretty),
        Command::Bedfund => (client.build_info(NodeInfo::BedFund), pretty),
        Command::Patsum(args) => (
            client.build_patient_summary(&args.id, args.firstname, args.lastname),
            pretty,
        ),
        Command::Docview(args) => (
            client.build_document_view(&args.provoid, &args.eventid),
            pretty,
        ),
        Command::Survey(args) => {
            let query = SurveyQuery {
                rc: args.rc,
                lastname: args.lastname,
                from: Some(args.from),
                to: args.to,
            };
            (client.build_survey(&query), pretty)
        }
        Command::Handover(args) => {
            let directive = match (args.output, args.encoded) {
                (Some(path), false) => Directive::DecodeField {
                    field: "body",
                    target: OutputTarget::File(path),
                },
                (Some(path), true) => Directive::ExtractField {
                    field: "body",
                    target: OutputTarget::File(path),
                },
                (None, _) => pretty,
            };
            let query = HandoverQuery {
                patient_oid: args.patoid,
                provider_oid: args.orgoid,
                document_oid: args.docoid,
                body_type: args.bodytype,
            };
            (client.build_handover(&query), directive)
        }
        Command::Senddoc(args) => {
            let document = read_document(args.input)?;
            (client.build_send_document(document, &args.contype), pretty)
        }
        Command::Recvdoc(args) => (
            client.build_receive_document(),
            Directive::WriteBody {
                target: OutputTarget::from(args.output),
            },
        ),
        Command::Rescnotif(args) => (
            client.build_rescue_notifications(args.period, args.status),
            pretty,
        ),
    };
    Ok(planned)
}

pub fn run(cli: Cli) -> Result<(), ClientError> {
    let session = cli.session();
    let client = IsacClient::new(session.base_url(), session.username.clone());
    let (request, directive) = plan(&client, &session, cli.command)?;
    let transport = Transport::for_session(&session);
    invoke(&transport, &request, &directive, &mut io::stdout().lock())
}
