//! CLI command implementations
//!
//! `init` prepares a data directory. `start` opens the journals, then
//! answers one JSON request per stdin line until EOF. A request that fails
//! gets an error response; only I/O failure on stdin/stdout ends the loop.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::UserRepository;
use crate::config::{Secret, WikiConfig};
use crate::errors::{WikiError, WikiResult};
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::pages::{HistoryRepository, PageRepository, PageVersion};
use crate::wiki::{FileWiki, Wiki};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{error_response, ok_response, read_lines, write_line, write_response};

/// One request line
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Signup {
        name: String,
        password: String,
        #[serde(default)]
        email: Option<String>,
    },
    Login {
        name: String,
        password: String,
    },
    Authenticate {
        token: String,
    },
    View {
        title: String,
        #[serde(default)]
        version: Option<u64>,
    },
    Edit {
        token: String,
        title: String,
        content: String,
    },
    History {
        title: String,
    },
    RecentViews,
    LastVisited,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config } => start(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<WikiConfig> {
    let config = WikiConfig::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("config", config_path.display().to_string().as_str()),
            ("data_dir", config.data_dir.as_str()),
        ],
    );
    Ok(config)
}

/// Create the data directory and write a fresh secret.
///
/// Refuses to overwrite an existing secret: replacing it would silently
/// invalidate every issued session token.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let secret_path = config.secret_path();

    if secret_path.exists() {
        return Err(CliError::AlreadyInitialized(secret_path));
    }

    fs::create_dir_all(config.data_path())?;
    if let Some(parent) = secret_path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_secret(&secret_path, &Secret::generate())?;

    write_response(json!({
        "initialized": true,
        "data_dir": config.data_dir,
    }))
}

#[cfg(unix)]
fn write_secret(path: &Path, secret: &str) -> CliResult<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    writeln!(file, "{}", secret)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_secret(path: &Path, secret: &str) -> CliResult<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    writeln!(file, "{}", secret)?;
    Ok(())
}

/// Open the store and serve requests from stdin until EOF.
pub fn start(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let secret_path = config.secret_path();

    if !secret_path.exists() {
        return Err(CliError::NotInitialized(secret_path));
    }

    let secret = Secret::load(&secret_path)?;
    log_event(Event::SecretLoaded);

    let wiki = FileWiki::open(config.data_path(), &config, &secret).map_err(|e| {
        if let Some(event) = open_failure_event(&e) {
            log_event_with_fields(event, &[("error", e.to_string().as_str())]);
        }
        CliError::from(e)
    })?;

    log_event(Event::ServeStart);
    let mut stdout = io::stdout();
    let mut served = 0u64;

    for line in read_lines() {
        let response = handle_line(&wiki, &line?);
        write_line(&mut stdout, &response)?;
        served += 1;
    }

    log_event_with_fields(Event::ServeStop, &[("requests", served.to_string().as_str())]);
    Ok(())
}

/// Event worth logging when the store fails to open. Plain I/O errors
/// are reported through the returned `CliError` only.
fn open_failure_event(err: &WikiError) -> Option<Event> {
    match err {
        WikiError::DataCorruption(_) => Some(Event::StoreCorrupted),
        WikiError::StoreLocked(_) => Some(Event::StoreLocked),
        _ => None,
    }
}

/// Parse and execute one request line, producing its response.
pub fn handle_line<P, H, U>(wiki: &Wiki<P, H, U>, line: &str) -> Value
where
    P: PageRepository,
    H: HistoryRepository,
    U: UserRepository,
{
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return error_response("WIKI_CLI_BAD_REQUEST", &format!("Invalid request: {}", e))
        }
    };

    match execute(wiki, request) {
        Ok(data) => ok_response(data),
        Err(e) => error_response(e.code(), &e.to_string()),
    }
}

fn execute<P, H, U>(wiki: &Wiki<P, H, U>, request: Request) -> WikiResult<Value>
where
    P: PageRepository,
    H: HistoryRepository,
    U: UserRepository,
{
    let data = match request {
        Request::Signup {
            name,
            password,
            email,
        } => {
            let (user, token) = wiki.signup(&name, &password, email.as_deref())?;
            json!({ "user": user.profile(), "token": token })
        }
        Request::Login { name, password } => {
            let (user, token) = wiki.login(&name, &password)?;
            json!({ "user": user.profile(), "token": token })
        }
        Request::Authenticate { token } => {
            let user = wiki.authenticate(&token)?;
            json!({ "user": user.map(|u| u.profile()) })
        }
        Request::View { title, version } => {
            let page = match version {
                Some(n) => wiki.view_version(&title, n)?,
                None => wiki.view(&title)?,
            };
            json!({ "page": page.as_ref().map(page_json) })
        }
        Request::Edit {
            token,
            title,
            content,
        } => page_json(&wiki.edit(&token, &title, &content)?),
        Request::History { title } => {
            let versions: Vec<Value> = wiki.page_history(&title)?.iter().map(page_json).collect();
            json!({ "title": title, "versions": versions })
        }
        Request::RecentViews => json!({ "entries": wiki.recent_views()? }),
        Request::LastVisited => json!({ "title": wiki.last_visited()? }),
    };
    Ok(data)
}

fn page_json(page: &PageVersion) -> Value {
    json!({
        "title": page.title(),
        "version": page.version(),
        "content": page.content(),
        "created": page.created(),
        "last_modified": page.last_modified(),
        "edit_link": page.edit_link(),
    })
}
