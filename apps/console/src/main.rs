use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    lists::DEFAULT_ORDER, AccountContext, AssignmentCommand, CommandDispatcher, CommandOutcome,
    Console, EntityTarget, HttpTransport, ListOutcome, ListQuery, PromptResult, ServerContext,
    SessionStep, WorkflowState,
};
use shared::domain::{AccountId, Attribute, ServerId, SessionId, StateTag};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::{load_settings, ConsoleSettings, Overrides};
use terminal::TerminalSink;

#[derive(Parser, Debug)]
#[command(name = "console", about = "Tunnel service administration console")]
struct Args {
    /// Config file; defaults to ./console.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    session_token: Option<String>,
    /// `latest-issued` or `last-completed`.
    #[arg(long)]
    ordering: Option<String>,
    /// `allow` or `reject`.
    #[arg(long)]
    in_flight: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Landing page roster (new users).
    Home,
    Users {
        #[arg(default_value = "all")]
        list: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        cnt: Option<u32>,
        #[arg(long, default_value = DEFAULT_ORDER)]
        order: String,
    },
    Servers {
        #[arg(default_value = "all")]
        list: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        cnt: Option<u32>,
        #[arg(long, default_value = DEFAULT_ORDER)]
        order: String,
    },
    UserHistory {
        uid: i64,
        login: String,
        #[arg(default_value = "activity")]
        list: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    UserSessions {
        uid: i64,
        login: String,
    },
    ServerList {
        vid: i64,
        name: String,
        #[arg(default_value = "assigned-sessions")]
        list: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Sends the inverse of the tag currently shown for the account.
    ToggleUser {
        uid: i64,
        login: String,
        #[arg(long)]
        current: StateTag,
    },
    ToggleServer {
        vid: i64,
        name: String,
        #[arg(long)]
        current: StateTag,
    },
    SetUserAttr {
        uid: i64,
        login: String,
        attr: Attribute,
        value: String,
    },
    SetServerAttr {
        vid: i64,
        name: String,
        attr: Attribute,
        value: String,
    },
    ResetPassword {
        uid: i64,
        login: String,
    },
    /// Hands a tunnel session on the server to the account with `login`.
    Assign {
        vid: i64,
        name: String,
        login: String,
        #[arg(long)]
        reassign: bool,
    },
    /// Activates or deactivates one of the account's tunnel sessions.
    Session {
        uid: i64,
        login: String,
        sid: i64,
        /// Tunnel destination for activation; omitted means empty.
        #[arg(long)]
        destination: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    settings.apply_overrides(&Overrides {
        server_url: args.server_url,
        session_token: args.session_token,
        ordering: args.ordering,
        in_flight: args.in_flight,
    })?;
    info!(
        server_url = %settings.server_url,
        ordering = ?settings.ordering,
        in_flight = ?settings.in_flight,
        "console: settings loaded"
    );

    let transport = HttpTransport::with_timeout(&settings.server_url, settings.request_timeout())?;
    let dispatcher = CommandDispatcher::new(Arc::new(transport), settings.session_token.clone());
    let console = Console::new(dispatcher, Arc::new(TerminalSink), settings.options());

    let succeeded = run(&console, &settings, args.command).await?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn listed(outcome: ListOutcome) -> bool {
    outcome != ListOutcome::Failed
}

fn confirmed(outcome: CommandOutcome) -> bool {
    outcome == CommandOutcome::Confirmed
}

async fn run(console: &Console, settings: &ConsoleSettings, command: Command) -> Result<bool> {
    let succeeded = match command {
        Command::Home => listed(console.lists().load(&ListQuery::home()).await),
        Command::Users {
            list,
            page,
            cnt,
            order,
        } => {
            let query = ListQuery::accounts(&list, page, cnt.unwrap_or(settings.page_size), &order);
            listed(console.lists().load(&query).await)
        }
        Command::Servers {
            list,
            page,
            cnt,
            order,
        } => {
            let query = ListQuery::servers(&list, page, cnt.unwrap_or(settings.page_size), &order);
            listed(console.lists().load(&query).await)
        }
        Command::UserHistory {
            uid,
            login,
            list,
            page,
        } => {
            let account = AccountContext::new(AccountId(uid), login);
            let query = ListQuery::account_history(&account, &list).with_page(page);
            listed(console.lists().load(&query).await)
        }
        Command::UserSessions { uid, login } => {
            let account = AccountContext::new(AccountId(uid), login);
            listed(console.lists().load_account_sessions(&account).await.outcome)
        }
        Command::ServerList {
            vid,
            name,
            list,
            page,
        } => {
            let server = ServerContext::new(ServerId(vid), name);
            let query = ListQuery::server_list(&server, &list).with_page(page);
            listed(console.lists().load(&query).await)
        }
        Command::ToggleUser {
            uid,
            login,
            current,
        } => {
            let account = AccountContext::new(AccountId(uid), login);
            confirmed(
                console
                    .toggles()
                    .toggle(EntityTarget::Account(&account), current)
                    .await,
            )
        }
        Command::ToggleServer { vid, name, current } => {
            let server = ServerContext::new(ServerId(vid), name);
            confirmed(
                console
                    .toggles()
                    .toggle(EntityTarget::Server(&server), current)
                    .await,
            )
        }
        Command::SetUserAttr {
            uid,
            login,
            attr,
            value,
        } => {
            let account = AccountContext::new(AccountId(uid), login);
            confirmed(
                console
                    .toggles()
                    .change_attr(EntityTarget::Account(&account), attr, &value)
                    .await,
            )
        }
        Command::SetServerAttr {
            vid,
            name,
            attr,
            value,
        } => {
            let server = ServerContext::new(ServerId(vid), name);
            confirmed(
                console
                    .toggles()
                    .change_attr(EntityTarget::Server(&server), attr, &value)
                    .await,
            )
        }
        Command::ResetPassword { uid, login } => {
            let account = AccountContext::new(AccountId(uid), login);
            confirmed(console.toggles().reset_password(&account).await)
        }
        Command::Assign {
            vid,
            name,
            login,
            reassign,
        } => {
            let command = if reassign {
                AssignmentCommand::Reassign
            } else {
                AssignmentCommand::Assign
            };
            let mut workflow = console.assignment(ServerContext::new(ServerId(vid), name), command);
            matches!(
                workflow.submit(&login).await,
                WorkflowState::Done(CommandOutcome::Confirmed)
            )
        }
        Command::Session {
            uid,
            login,
            sid,
            destination,
        } => {
            let account = AccountContext::new(AccountId(uid), login);
            let roster = console.lists().load_account_sessions(&account).await;
            let session = roster
                .sessions
                .into_iter()
                .find(|session| session.session == SessionId(sid))
                .ok_or_else(|| anyhow!("session {sid} is not assigned to {}", account.login))?;

            match console.activation().toggle(&session).await {
                SessionStep::Sent(outcome) => confirmed(outcome),
                SessionStep::AwaitingDestination(prompt) => match destination {
                    Some(destination) => confirmed(prompt.submit(&destination).await),
                    None => match prompt.confirm_key("").await {
                        PromptResult::Sent(outcome) => confirmed(outcome),
                        PromptResult::Open(prompt) => {
                            prompt.cancel();
                            false
                        }
                    },
                },
            }
        }
    };
    Ok(succeeded)
}
