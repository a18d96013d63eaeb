//! Purpose: `eventdesk` CLI entry point; drives the API gateway from a terminal.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Successful commands print exactly one JSON value on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All API traffic goes through `api::Gateway` (credential + error policy).
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use eventdesk::api::{
    CredentialsMode, Error, ErrorKind, EventsService, FileStore, Gateway, GatewayConfig, Method,
    QueuedNavigator, RequestOptions, Session, resolve_session_file, to_exit_code,
};
use eventdesk::notice::SessionExpiredNotice;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome { exit_code });
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();

    let color_mode = cli.color;
    let context = CliContext {
        api_url: cli.api_url,
        session_file: resolve_session_file(cli.session_file, |key| std::env::var(key).ok()),
        color_mode,
    };

    command_dispatch::dispatch_command(cli.command, &context).map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "eventdesk",
    version,
    about = "Authenticated client for the eventdesk planning API",
    long_about = None,
    before_help = r#"Every API call carries the stored bearer token and fails with one
structured error. A 401 clears the stored session."#,
    after_help = r#"EXAMPLES
  $ export EVENTDESK_API_URL=https://planner.example.com/api
  $ eventdesk login --token "$TOKEN" --user '{"id":42,"name":"Ada"}'
  $ eventdesk events list --organizer 42
  $ eventdesk request POST /events --data-json '{"title":"Gala"}'
  $ eventdesk logout"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "API base address (default: $EVENTDESK_API_URL); paths are appended verbatim"
    )]
    api_url: Option<String>,
    #[arg(
        long,
        global = true,
        help = "Session file (default: $EVENTDESK_SESSION_FILE or ~/.eventdesk/session.json)",
        value_hint = ValueHint::FilePath
    )]
    session_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CredentialsCli {
    Omit,
    SameOrigin,
    Include,
}

impl From<CredentialsCli> for CredentialsMode {
    fn from(value: CredentialsCli) -> Self {
        match value {
            CredentialsCli::Omit => CredentialsMode::Omit,
            CredentialsCli::SameOrigin => CredentialsMode::SameOrigin,
            CredentialsCli::Include => CredentialsMode::Include,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Store a bearer token (and optional user profile) in the session file",
        after_help = r#"EXAMPLES
  $ eventdesk login --token eyJhbGciOi...
  $ eventdesk login --token eyJhbGciOi... --user '{"id":42}'"#
    )]
    Login {
        #[arg(long, help = "Bearer token sent as `Authorization: Bearer <token>`")]
        token: String,
        #[arg(long, help = "Opaque user profile stored alongside the token")]
        user: Option<String>,
    },
    #[command(about = "Remove the stored token and user profile")]
    Logout,
    #[command(about = "Show whether a token is stored and the stored user profile")]
    Whoami,
    #[command(
        arg_required_else_help = true,
        about = "Send one request through the gateway and print the JSON response",
        after_help = r#"EXAMPLES
  $ eventdesk request GET /events/organizer/42
  $ eventdesk request PUT /events/7 --data-json '{"title":"Gala II"}'
  $ eventdesk request GET /reports --header 'Accept-Language: de'"#
    )]
    Request {
        #[arg(help = "HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS)")]
        method: String,
        #[arg(help = "Path appended to the base address, including the leading /")]
        path: String,
        #[arg(long = "data-json", help = "Request body as a single JSON value")]
        data_json: Option<String>,
        #[arg(long = "header", value_name = "NAME: VALUE", help = "Extra header (repeatable)")]
        headers: Vec<String>,
        #[arg(long, value_enum, help = "Credential-inclusion mode forwarded to the transport")]
        credentials: Option<CredentialsCli>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Event endpoints",
        after_help = r#"EXAMPLES
  $ eventdesk events list --organizer 42
  $ eventdesk events create --data-json '{"title":"Gala","date":"2026-12-31"}'
  $ eventdesk events update 7 --data-json '{"title":"Gala II"}'"#
    )]
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },
    #[command(about = "Print version info as JSON")]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ eventdesk completion bash > ~/.local/share/bash-completion/completions/eventdesk
  $ eventdesk completion zsh > ~/.zfunc/_eventdesk"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum EventsCommand {
    #[command(about = "List events owned by an organizer")]
    List {
        #[arg(long, help = "Organizer id")]
        organizer: String,
    },
    #[command(about = "Fetch one event")]
    Get {
        #[arg(help = "Event id")]
        id: String,
    },
    #[command(about = "Create an event from a JSON body")]
    Create {
        #[arg(long = "data-json", help = "Event as a JSON object")]
        data_json: String,
    },
    #[command(about = "Replace an event from a JSON body")]
    Update {
        #[arg(help = "Event id")]
        id: String,
        #[arg(long = "data-json", help = "Event as a JSON object")]
        data_json: String,
    },
    #[command(about = "Delete an event")]
    Delete {
        #[arg(help = "Event id")]
        id: String,
    },
}

struct CliContext {
    api_url: Option<String>,
    session_file: PathBuf,
    color_mode: ColorMode,
}

impl CliContext {
    fn session(&self) -> Session {
        Session::new(Arc::new(FileStore::new(&self.session_file)))
    }

    /// Gateway plus the queue its session-expiry redirects land on.
    fn gateway(&self) -> Result<(Gateway, Receiver<String>), Error> {
        let config = GatewayConfig::resolve(
            self.api_url.clone(),
            Some(self.session_file.clone()),
            |key| std::env::var(key).ok(),
        )?;
        let (navigator, redirects) = QueuedNavigator::new("/");
        let gateway =
            Gateway::new(config.base_url, self.session()).with_navigator(Arc::new(navigator));
        Ok((gateway, redirects))
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .try_init();
}

fn parse_inline_json(data: &str) -> Result<Value, Error> {
    serde_json::from_str(data).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid json")
            .with_hint("Provide a single JSON value (e.g. '{\"title\":\"Gala\"}').")
            .with_source(err)
    })
}

fn parse_header(raw: &str) -> Result<(String, String), Error> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid header: {raw}"))
            .with_hint("Use NAME: VALUE, for example --header 'X-Request-Id: 7'.")),
    }
}

fn build_request_options(
    method: &str,
    data_json: Option<&str>,
    headers: &[String],
    credentials: Option<CredentialsCli>,
) -> Result<RequestOptions, Error> {
    let mut options = RequestOptions::new().method(method.parse::<Method>()?);
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        options = options.header(name, value);
    }
    if let Some(data) = data_json {
        options = options.json(&parse_inline_json(data)?)?;
    }
    if let Some(mode) = credentials {
        options = options.credentials(mode.into());
    }
    Ok(options)
}

fn events_service(context: &CliContext) -> Result<(EventsService, Receiver<String>), Error> {
    let (gateway, redirects) = context.gateway()?;
    Ok((EventsService::new(gateway), redirects))
}

/// Reports redirects the gateway scheduled during this command, then passes `result` on.
fn finish_api_call(
    cmd: &str,
    result: Result<Value, Error>,
    redirects: &Receiver<String>,
    context: &CliContext,
) -> Result<RunOutcome, Error> {
    for route in redirects.try_iter() {
        let notice = SessionExpiredNotice::new(
            cmd,
            route,
            context.session_file.display().to_string(),
            notice_time_now().unwrap_or_default(),
        );
        emit_notice(&notice, context.color_mode);
    }
    let value = result?;
    emit_json(value);
    Ok(RunOutcome::ok())
}

fn user_json(user: Option<String>) -> Value {
    match user {
        Some(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        None => Value::Null,
    }
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("eventdesk {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(json!({
            "name": "eventdesk",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Usage\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &SessionExpiredNotice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {} (route: {})", notice.message, notice.route);
        return;
    }

    let json = notice.to_json_line().unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"session_expired\",\"message\":\"json encode failed\"}}"
            .to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Network => "network failure".to_string(),
        ErrorKind::Unauthorized => "not authenticated".to_string(),
        ErrorKind::Http => "http error".to_string(),
        ErrorKind::Decode => "invalid response json".to_string(),
        ErrorKind::Domain => "request rejected".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    use std::error::Error as _;

    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));
    if let Some(status) = err.status() {
        lines.push(format!(
            "{} {status}",
            colorize_label("status:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);
    let Some(usage) = usage else {
        return "Try `eventdesk --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "eventdesk") else {
        return "Try `eventdesk --help`.".to_string();
    };
    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .copied()
        .collect();
    if parts.is_empty() {
        return "Try `eventdesk --help`.".to_string();
    }
    format!("Try `eventdesk {} --help`.", parts.join(" "))
}
