//! Line-driven form session.
//!
//! Each input line is one UI action. Submissions run in the background like they would behind
//! a real button, so typing `submit` twice in quick succession hits the disabled control.

use crate::terminal::describe_form;
use relay_core::{FieldName, FormSession, SubmissionOutcome, UiEvent};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
commands:
  focus <field>          focus a field
  blur <field>           blur a field
  type <field> <text>    replace a field's value as if typed
  paste <field> <text>   paste text at the end of a field
  set <field> <text>     write a field programmatically (bypasses input events)
  key <Key>              press a key, e.g. `key Escape`
  submit                 press the submit button
  show                   print the form
  users                  list loaded users
  help                   this text
  quit                   leave
fields: name|field1, date|field2, report|field3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Focus(FieldName),
    Blur(FieldName),
    Type(FieldName, String),
    Paste(FieldName, String),
    Set(FieldName, String),
    Key(String),
    Submit,
    Show,
    Users,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();

    let field_and_text = |rest: &str| -> Result<(FieldName, String), String> {
        let (field, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        Ok((field.parse()?, text.to_string()))
    };

    match verb.to_ascii_lowercase().as_str() {
        "focus" => Ok(Command::Focus(rest.parse()?)),
        "blur" => Ok(Command::Blur(rest.parse()?)),
        "type" => field_and_text(rest).map(|(f, t)| Command::Type(f, t)),
        "paste" => field_and_text(rest).map(|(f, t)| Command::Paste(f, t)),
        "set" => field_and_text(rest).map(|(f, t)| Command::Set(f, t)),
        "key" if !rest.is_empty() => Ok(Command::Key(rest.to_string())),
        "key" => Err("key needs a key name".into()),
        "submit" => Ok(Command::Submit),
        "show" => Ok(Command::Show),
        "users" => Ok(Command::Users),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "" => Err("empty command".into()),
        other => Err(format!("unknown command: {other}")),
    }
}

pub fn print_outcome(outcome: &SubmissionOutcome) {
    match outcome {
        SubmissionOutcome::Succeeded { payload, ack } => {
            println!(
                "submitted {} ({}) for {}; webhook replied {}",
                payload.field1, payload.dep, payload.field2, ack
            );
        }
        SubmissionOutcome::Rejected(err) => println!("rejected: {}", err.user_message()),
        SubmissionOutcome::Failed(err) => println!("failed: {}", err.user_message()),
    }
}

fn print_field(session: &FormSession, field: FieldName) {
    let form = session.form();
    println!("{field}: {} [{}]", form.value(field), form.status(field));
}

pub fn execute(session: &Arc<FormSession>, command: Command) -> Flow {
    match command {
        Command::Focus(field) => {
            session.dispatch(UiEvent::Focus(field));
        }
        Command::Blur(field) => {
            session.dispatch(UiEvent::Blur(field));
        }
        Command::Type(field, value) => {
            session.dispatch(UiEvent::Input { field, value });
            print_field(session, field);
        }
        Command::Paste(field, text) => {
            session.dispatch(UiEvent::Paste { field, text });
            print_field(session, field);
        }
        Command::Set(field, value) => {
            session.form().set_value(field, value);
        }
        Command::Key(key) => {
            session.dispatch(UiEvent::KeyDown { key });
        }
        Command::Submit => {
            let session = session.clone();
            tokio::spawn(async move {
                match session.submit().await {
                    Some(outcome) => print_outcome(&outcome),
                    None => println!("submit button is disabled"),
                }
            });
        }
        Command::Show => println!("{}", describe_form(session.form())),
        Command::Users => {
            let users = session.reference_data();
            if users.is_empty() {
                println!("No users loaded ({:?}).", session.load_status());
            }
            for user in users.iter() {
                println!("{} ({})", user.name, user.dep);
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}

/// Read commands until `quit` or end of input.
pub async fn run<R>(session: Arc<FormSession>, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    println!("{}", describe_form(session.form()));
    println!("type `help` for commands");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(command) => {
                if execute(&session, command) == Flow::Quit {
                    break;
                }
            }
            Err(message) => println!("{message}"),
        }
        // Let background work (guard corrections, submissions) catch up before the next prompt.
        tokio::task::yield_now().await;
    }

    session.close();
    Ok(())
}
