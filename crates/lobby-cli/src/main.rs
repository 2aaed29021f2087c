//! lobby - console and chat client for the lobby assistant backend

mod commands;
mod config;
mod console;
mod credentials;
mod ops;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lobby_api::ApiClient;
use lobby_tui::Theme;

/// lobby - console and chat client
#[derive(Parser, Debug)]
#[command(name = "lobby")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and cache the token
    Login {
        #[arg(short, long)]
        username: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Drop the cached token
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Open the interactive console (the default)
    Console,
    /// Update the signed-in account
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// User administration
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Activity logs
    Logs {
        #[command(subcommand)]
        command: LogsCommand,
    },
    /// Server settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Agent access policies
    Agents {
        #[command(subcommand)]
        command: AgentsCommand,
    },
    /// Documents for the retrieval index
    Docs {
        #[command(subcommand)]
        command: DocsCommand,
    },
    /// Inspect user conversations (admin)
    Chats {
        #[command(subcommand)]
        command: ChatsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Change username/email
    SetProfile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Change the password
    SetPassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// List users
    List {
        /// Narrow by username/email substring
        #[arg(short, long)]
        query: Option<String>,
        /// Keep only users holding this role
        #[arg(short, long)]
        role: Option<String>,
        /// Keep only active (true) or inactive (false) users
        #[arg(short, long)]
        active: Option<bool>,
    },
    /// Update a user
    Set {
        /// User id
        id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Comma-separated role list (replaces the current roles)
        #[arg(long)]
        roles: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
}

/// Filter flags shared by `logs list` and `logs export`
#[derive(clap::Args, Debug)]
struct LogFilterArgs {
    /// Activity substring
    #[arg(short, long)]
    query: Option<String>,
    /// Severity (INFO, WARN, ERROR)
    #[arg(short, long, value_parser = parse_level)]
    level: Option<lobby_api::LogLevel>,
    /// Only rows for this user id
    #[arg(short, long)]
    user_id: Option<String>,
    /// Start date (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    from: Option<chrono::NaiveDate>,
    /// End date (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    to: Option<chrono::NaiveDate>,
}

impl LogFilterArgs {
    fn into_query(self) -> lobby_api::LogQuery {
        ops::build_log_query(self.query, self.level, self.user_id, self.from, self.to)
    }
}

#[derive(Subcommand, Debug)]
enum LogsCommand {
    /// List one page of logs
    List {
        #[command(flatten)]
        filter: LogFilterArgs,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Export the filtered logs as CSV
    Export {
        #[command(flatten)]
        filter: LogFilterArgs,
        /// Output path (default logs.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Delete log rows by id
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print current settings
    Get,
    /// Update settings from key=value pairs
    Set {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum AgentsCommand {
    /// Print the policy map
    Get,
    /// Update one agent's policy
    Set {
        /// Agent name
        name: String,
        #[arg(long)]
        enabled: Option<bool>,
        /// Comma-separated allowed roles (replaces the current list)
        #[arg(long)]
        roles: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum DocsCommand {
    /// Upload files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ChatsCommand {
    /// List a user's conversations
    List {
        /// User id
        user: String,
    },
    /// Show a conversation's messages
    Messages {
        chat_id: String,
        #[arg(long, default_value_t = 500)]
        limit: u32,
    },
    /// Post an assistant reply
    Reply { chat_id: String, text: String },
}

fn parse_level(s: &str) -> Result<lobby_api::LogLevel, String> {
    match s.to_uppercase().as_str() {
        "INFO" => Ok(lobby_api::LogLevel::Info),
        "WARN" => Ok(lobby_api::LogLevel::Warn),
        "ERROR" => Ok(lobby_api::LogLevel::Error),
        other => Err(format!("unknown level '{}', expected INFO/WARN/ERROR", other)),
    }
}

fn parse_date(s: &str) -> Result<chrono::NaiveDate, String> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a YYYY-MM-DD date", s))
}

/// Prompt on stdin when the password flag is omitted
fn read_password(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// The authenticated client, or an instruction to sign in first
fn signed_in_client(api_url: &str) -> anyhow::Result<(ApiClient, lobby_client::AuthContext)> {
    let Some(creds) = credentials::load() else {
        anyhow::bail!("not signed in; run `lobby login --username <name>` first");
    };
    Ok((
        ApiClient::new(api_url, creds.token.clone()),
        creds.auth_context(),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("lobby=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();
    let api_url = cfg.api_url(args.api_url.as_deref());

    let result = match args.command {
        Some(Command::Login { username, password }) => {
            let password = read_password(password)?;
            ops::login(&api_url, &username, &password).await
        }
        Some(Command::Logout) => {
            credentials::clear()?;
            println!("Signed out.");
            Ok(())
        }
        Some(Command::Whoami) => {
            let (client, _) = signed_in_client(&api_url)?;
            ops::whoami(&client).await
        }
        Some(Command::Account { command }) => {
            let (client, _) = signed_in_client(&api_url)?;
            match command {
                AccountCommand::SetProfile { username, email } => {
                    ops::set_profile(&client, username, email).await
                }
                AccountCommand::SetPassword { current, new } => {
                    ops::set_password(&client, &current, &new).await
                }
            }
        }
        Some(Command::Users { command }) => {
            let (client, _) = signed_in_client(&api_url)?;
            match command {
                UsersCommand::List { query, role, active } => {
                    ops::users_list(&client, query, role, active).await
                }
                UsersCommand::Set {
                    id,
                    username,
                    email,
                    roles,
                    active,
                } => ops::users_set(&client, &id, username, email, roles, active).await,
            }
        }
        Some(Command::Logs { command }) => {
            let (client, _) = signed_in_client(&api_url)?;
            match command {
                LogsCommand::List {
                    filter,
                    page,
                    page_size,
                } => {
                    let page_size = page_size.or(cfg.page_size).unwrap_or(25);
                    ops::logs_list(&client, filter.into_query(), page, page_size).await
                }
                LogsCommand::Export { filter, out } => {
                    ops::logs_export(&client, filter.into_query(), out).await
                }
                LogsCommand::Delete { ids } => ops::logs_delete(&client, &ids).await,
            }
        }
        Some(Command::Settings { command }) => {
            let (client, _) = signed_in_client(&api_url)?;
            match command {
                SettingsCommand::Get => ops::settings_get(&client).await,
                SettingsCommand::Set { pairs } => ops::settings_set(&client, &pairs).await,
            }
        }
        Some(Command::Agents { command }) => {
            let (client, _) = signed_in_client(&api_url)?;
            match command {
                AgentsCommand::Get => ops::agents_get(&client).await,
                AgentsCommand::Set {
                    name,
                    enabled,
                    roles,
                } => ops::agents_set(&client, &name, enabled, roles).await,
            }
        }
        Some(Command::Docs { command }) => {
            let (client, _) = signed_in_client(&api_url)?;
            match command {
                DocsCommand::Upload { files } => ops::docs_upload(&client, &files).await,
            }
        }
        Some(Command::Chats { command }) => {
            let (client, _) = signed_in_client(&api_url)?;
            match command {
                ChatsCommand::List { user } => ops::chats_for_user(&client, &user).await,
                ChatsCommand::Messages { chat_id, limit } => {
                    ops::chat_messages(&client, &chat_id, limit).await
                }
                ChatsCommand::Reply { chat_id, text } => {
                    ops::chat_reply(&client, &chat_id, &text).await
                }
            }
        }
        Some(Command::Console) | None => {
            let (client, ctx) = signed_in_client(&api_url)?;
            let theme = match cfg.theme.as_deref() {
                Some("light") => Theme::light(),
                _ => Theme::dark(),
            };
            let days = cfg.days.unwrap_or(lobby_client::dashboard::DEFAULT_DAYS);
            let page_size = cfg.page_size.unwrap_or(25);
            console::run_console(client, &ctx, theme, days, page_size).await
        }
    };

    if let Err(err) = result {
        // 401 means the cached token is stale; 403 means the role is missing
        if let Some(api) = err.downcast_ref::<lobby_api::Error>() {
            if api.is_unauthorized() {
                let _ = credentials::clear();
                eprintln!("Session expired. Run `lobby login` to sign in again.");
                std::process::exit(1);
            }
            if api.is_forbidden() {
                eprintln!("This operation needs the admin role.");
                std::process::exit(1);
            }
        }
        return Err(err);
    }

    Ok(())
}
