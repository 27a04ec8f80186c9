use clap::{Parser, Subcommand};
use relay_cli::{config_from_env, init_tracing, interactive, open_session};
use relay_core::{FieldName, LoadStatus, RelayConfig, UiEvent};
use tokio::io::BufReader;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Daily report form client")]
struct Cli {
    /// Reference-data endpoint (overrides RELAY_USERS_URL)
    #[arg(long, global = true)]
    users_url: Option<String>,
    /// Webhook endpoint (overrides RELAY_WEBHOOK_URL)
    #[arg(long, global = true)]
    webhook_url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List authorised users
    Users,
    /// Check a single field value the way the form does while typing
    Check {
        /// Field: name, date or report (or field1..field3)
        field: FieldName,
        /// Value to check
        value: String,
    },
    /// Fill in and submit the form once
    Submit {
        /// Name of an authorised user
        #[arg(long)]
        name: String,
        /// Report text
        #[arg(long)]
        report: String,
    },
    /// Drive the form line by line from stdin
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("relay=info")?;

    let cli = Cli::parse();

    let config = match (cli.users_url, cli.webhook_url) {
        (None, None) => config_from_env()?,
        (users, webhook) => RelayConfig::from_env_values(
            users.or_else(|| std::env::var("RELAY_USERS_URL").ok()),
            webhook.or_else(|| std::env::var("RELAY_WEBHOOK_URL").ok()),
        )?,
    };

    match cli.command {
        Some(Commands::Users) => {
            let session = open_session(config)?;
            match session.wait_for_reference_data().await {
                LoadStatus::Loaded(0) => println!("No users found."),
                LoadStatus::Loaded(_) => {
                    for user in session.reference_data().iter() {
                        println!("{} ({})", user.name, user.dep);
                    }
                }
                LoadStatus::Failed | LoadStatus::Pending => {
                    session.close();
                    anyhow::bail!("could not load users from {}", session.config().users_url());
                }
            }
            session.close();
        }
        Some(Commands::Check { field, value }) => {
            let session = open_session(config)?;
            session.wait_for_reference_data().await;
            println!("{}", session.validate(field, &value));
            session.close();
        }
        Some(Commands::Submit { name, report }) => {
            let session = open_session(config)?;
            session.wait_for_reference_data().await;

            session.dispatch(UiEvent::Input {
                field: FieldName::Name,
                value: name,
            });
            session.dispatch(UiEvent::Input {
                field: FieldName::Report,
                value: report,
            });

            let outcome = session.submit().await;
            session.close();

            match outcome {
                Some(outcome) => {
                    interactive::print_outcome(&outcome);
                    if let Some(err) = outcome.error() {
                        anyhow::bail!("{}", err.user_message());
                    }
                }
                None => anyhow::bail!("a submission is already in flight"),
            }
        }
        Some(Commands::Interactive) => {
            let session = open_session(config)?;
            interactive::run(session, BufReader::new(tokio::io::stdin())).await?;
        }
        None => {
            println!("Use 'relay --help' for commands");
        }
    }

    Ok(())
}
