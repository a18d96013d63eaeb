//! Purpose: Hold top-level CLI command dispatch for `eventdesk`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Session commands never touch the network.
//! Invariants: API commands report scheduled session-expiry redirects before returning.

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    context: &CliContext,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "eventdesk", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Login { token, user } => {
            if token.trim().is_empty() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("token must not be empty")
                    .with_hint("Pass the bearer token issued by the sign-in flow."));
            }
            context.session().login(&token, user.as_deref())?;
            emit_json(json!({
                "logged_in": true,
                "session_file": context.session_file.display().to_string(),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Logout => {
            context.session().clear()?;
            emit_json(json!({ "logged_out": true }));
            Ok(RunOutcome::ok())
        }
        Command::Whoami => {
            let session = context.session();
            emit_json(json!({
                "authenticated": session.is_authenticated()?,
                "user": user_json(session.user()?),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Request {
            method,
            path,
            data_json,
            headers,
            credentials,
        } => {
            let options =
                build_request_options(&method, data_json.as_deref(), &headers, credentials)?;
            let (gateway, redirects) = context.gateway()?;
            let result = gateway.request(&path, options);
            finish_api_call("request", result, &redirects, context)
        }
        Command::Events { command } => dispatch_events(command, context),
    }
}

fn dispatch_events(command: EventsCommand, context: &CliContext) -> Result<RunOutcome, Error> {
    let (events, redirects) = events_service(context)?;
    let (cmd, result) = match command {
        EventsCommand::List { organizer } => ("events list", events.list_for_organizer(&organizer)),
        EventsCommand::Get { id } => ("events get", events.get(&id)),
        EventsCommand::Create { data_json } => {
            let event = parse_inline_json(&data_json)?;
            ("events create", events.create(&event))
        }
        EventsCommand::Update { id, data_json } => {
            let event = parse_inline_json(&data_json)?;
            ("events update", events.update(&id, &event))
        }
        EventsCommand::Delete { id } => ("events delete", events.delete(&id)),
    };
    finish_api_call(cmd, result, &redirects, context)
}
