use crate::application::commands::{
    AppState, TaskInput, TaskListQuery, change_password_impl, complete_task_impl,
    create_task_impl, dashboard_impl, delete_task_impl, edit_task_impl, list_tasks_impl,
    login_impl, logout_impl, profile_impl, request_password_reset_impl, reset_password_impl,
    signup_impl, update_profile_impl,
};
use crate::render::Renderer;
use clap::{ArgAction, Parser, Subcommand};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const WORKSPACE_ENV: &str = "TASKPILOT_HOME";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskpilot",
    version,
    about = "Personal task manager client: sign in, then plan today, upcoming and overdue work"
)]
pub struct Cli {
    /// Workspace holding config/, state/ and logs/ (defaults to $TASKPILOT_HOME or the current directory)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the session
    Logout,
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    Password {
        #[command(subcommand)]
        action: PasswordCommand,
    },
    /// Greeting, task counts and the grouped task list
    Dashboard,
    Tasks {
        #[command(subcommand)]
        action: TaskCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    Show,
    /// Omitted fields keep their current value
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PasswordCommand {
    /// Change the password of the signed-in user; signs out on success
    Change {
        #[arg(long)]
        current: String,
        #[arg(long = "new")]
        new_password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Email a six-digit reset code
    ResetRequest {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using the emailed code
    Reset {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long = "new")]
        new_password: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    List {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Earliest time of day (HH:MM)
        #[arg(long)]
        start_time: Option<String>,
        /// Latest time of day (HH:MM)
        #[arg(long)]
        end_time: Option<String>,
        /// default, date-asc, date-desc, time-asc or time-desc
        #[arg(long)]
        sort: Option<String>,
    },
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Due time (HH:MM, default 12:00)
        #[arg(long)]
        time: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },
    /// Mark a task as completed
    Done { id: String },
    Delete { id: String },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> Result<(), String> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|error| format!("invalid RUST_LOG / log filter: {error}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(error) = init_result {
        debug!(%error, "tracing subscriber already set, continuing");
    }
    Ok(())
}

pub fn resolve_workspace<F>(explicit: Option<PathBuf>, lookup: F) -> Result<PathBuf, String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(path) = lookup(WORKSPACE_ENV).filter(|value| !value.trim().is_empty()) {
        return Ok(PathBuf::from(path.trim()));
    }
    std::env::current_dir().map_err(|error| format!("cannot determine current directory: {error}"))
}

pub fn run(args: Vec<OsString>) -> Result<(), String> {
    let cli = Cli::parse_from(args);
    init_tracing(cli.verbose, cli.quiet)?;

    let workspace_root = resolve_workspace(cli.workspace.clone(), |key| std::env::var(key).ok())?;
    let state = AppState::new(workspace_root).map_err(|error| error.to_string())?;
    info!(
        workspace = %state.workspace_root().display(),
        backend = %state.config().backend_url,
        timezone = %state.config().timezone,
        "starting taskpilot"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|error| format!("failed to start async runtime: {error}"))?;
    let renderer = Renderer::new(std::io::stdout().is_terminal());

    let output = runtime.block_on(dispatch(&state, &renderer, cli.command))?;
    print!("{output}");
    Ok(())
}

async fn dispatch(state: &AppState, renderer: &Renderer, command: Command) -> Result<String, String> {
    match command {
        Command::Login { email, password } => login_impl(state, email, password)
            .await
            .map(|message| format!("{message}\n"))
            .map_err(|error| state.command_error("login", &error)),
        Command::Signup {
            name,
            email,
            password,
        } => signup_impl(state, name, email, password)
            .await
            .map(|message| format!("{message}\n"))
            .map_err(|error| state.command_error("signup", &error)),
        Command::Logout => logout_impl(state)
            .await
            .map(|message| format!("{message}\n"))
            .map_err(|error| state.command_error("logout", &error)),
        Command::Profile { action } => match action {
            ProfileCommand::Show => profile_impl(state)
                .await
                .map(|user| renderer.profile(&user))
                .map_err(|error| state.command_error("profile", &error)),
            ProfileCommand::Update { name, email } => update_profile_impl(state, name, email)
                .await
                .map(|change| {
                    let mut out = change
                        .message
                        .map(|message| format!("{message}\n"))
                        .unwrap_or_default();
                    out.push_str(&renderer.profile(&change.user));
                    out
                })
                .map_err(|error| state.command_error("update_profile", &error)),
        },
        Command::Password { action } => match action {
            PasswordCommand::Change {
                current,
                new_password,
                confirm,
            } => change_password_impl(state, current, new_password, confirm)
                .await
                .map(|message| format!("{message}\n"))
                .map_err(|error| state.command_error("change_password", &error)),
            PasswordCommand::ResetRequest { email } => request_password_reset_impl(state, email)
                .await
                .map(|message| format!("{message}\n"))
                .map_err(|error| state.command_error("request_password_reset", &error)),
            PasswordCommand::Reset {
                email,
                otp,
                new_password,
            } => reset_password_impl(state, email, otp, new_password)
                .await
                .map(|message| format!("{message}\n"))
                .map_err(|error| state.command_error("reset_password", &error)),
        },
        Command::Dashboard => dashboard_impl(state)
            .await
            .map(|response| renderer.dashboard(&response))
            .map_err(|error| state.command_error("dashboard", &error)),
        Command::Tasks { action } => match action {
            TaskCommand::List {
                from,
                to,
                start_time,
                end_time,
                sort,
            } => list_tasks_impl(
                state,
                TaskListQuery {
                    from,
                    to,
                    start_time,
                    end_time,
                    sort,
                },
            )
            .await
            .map(|response| renderer.task_list_response(&response))
            .map_err(|error| state.command_error("list_tasks", &error)),
            TaskCommand::Add {
                title,
                description,
                date,
                time,
            } => create_task_impl(
                state,
                TaskInput {
                    title: Some(title),
                    description: Some(description),
                    date: Some(date),
                    time,
                },
            )
            .await
            .map(|outcome| renderer.mutation(&outcome))
            .map_err(|error| state.command_error("create_task", &error)),
            TaskCommand::Edit {
                id,
                title,
                description,
                date,
                time,
            } => edit_task_impl(
                state,
                id,
                TaskInput {
                    title,
                    description,
                    date,
                    time,
                },
            )
            .await
            .map(|outcome| renderer.mutation(&outcome))
            .map_err(|error| state.command_error("edit_task", &error)),
            TaskCommand::Done { id } => complete_task_impl(state, id)
                .await
                .map(|outcome| renderer.mutation(&outcome))
                .map_err(|error| state.command_error("complete_task", &error)),
            TaskCommand::Delete { id } => delete_task_impl(state, id)
                .await
                .map(|outcome| renderer.mutation(&outcome))
                .map_err(|error| state.command_error("delete_task", &error)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_task_list_flags() {
        let cli = Cli::try_parse_from([
            "taskpilot",
            "-vv",
            "tasks",
            "list",
            "--from",
            "2024-01-01",
            "--start-time",
            "09:00",
            "--sort",
            "time-asc",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Tasks {
                action:
                    TaskCommand::List {
                        from,
                        start_time,
                        sort,
                        to,
                        ..
                    },
            } => {
                assert_eq!(from.as_deref(), Some("2024-01-01"));
                assert_eq!(start_time.as_deref(), Some("09:00"));
                assert_eq!(sort.as_deref(), Some("time-asc"));
                assert_eq!(to, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_password_change_and_global_workspace() {
        let cli = Cli::try_parse_from([
            "taskpilot",
            "password",
            "change",
            "--current",
            "Old12345",
            "--new",
            "New12345",
            "--confirm",
            "New12345",
            "--workspace",
            "/tmp/tp",
        ])
        .expect("parse");
        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/tp")));
        assert!(matches!(
            cli.command,
            Command::Password {
                action: PasswordCommand::Change { .. }
            }
        ));
    }

    #[test]
    fn workspace_prefers_flag_then_environment() {
        let explicit = resolve_workspace(Some(PathBuf::from("/a")), |_| Some("/b".to_string()))
            .expect("workspace");
        assert_eq!(explicit, PathBuf::from("/a"));

        let from_env = resolve_workspace(None, |key| {
            (key == "TASKPILOT_HOME").then(|| "/b".to_string())
        })
        .expect("workspace");
        assert_eq!(from_env, PathBuf::from("/b"));
    }
}
