use crate::application::bootstrap::{BootstrapResult, bootstrap_workspace};
use crate::application::session::{ProfileChange, SessionContext, SessionManager};
use crate::application::task_list::{DashboardSummary, TaskListView};
use crate::domain::filter::TaskFilter;
use crate::domain::models::{SessionToken, Task, UserProfile};
use crate::domain::sorter::SortOption;
use crate::domain::task_form::TaskForm;
use crate::infrastructure::auth_client::{AuthClient, ReqwestAuthClient};
use crate::infrastructure::config::{AppConfig, CredentialStoreKind};
use crate::infrastructure::credential_store::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore,
};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::task_gateway::{ReqwestTaskGateway, TaskGateway, TaskMutation};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct AppState {
    workspace_root: PathBuf,
    config: AppConfig,
    logs_dir: PathBuf,
    session: SessionManager<dyn CredentialStore, dyn AuthClient>,
    gateway: Arc<dyn TaskGateway>,
    now_provider: NowProvider,
    runtime: Mutex<RuntimeState>,
    log_guard: Mutex<()>,
}

#[derive(Debug, Default)]
struct RuntimeState {
    tasks: Vec<Task>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        Self::from_lookup(workspace_root, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(workspace_root: PathBuf, lookup: F) -> Result<Self, InfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bootstrap = bootstrap_workspace(&workspace_root, lookup)?;
        let credential_store: Arc<dyn CredentialStore> = match bootstrap.config.credential_store {
            CredentialStoreKind::File => Arc::new(FileCredentialStore::new(&bootstrap.state_dir)),
            CredentialStoreKind::Keyring => Arc::new(KeyringCredentialStore::default()),
        };
        let backend_url = bootstrap.config.backend_url.clone();
        Ok(Self::with_services(
            bootstrap,
            credential_store,
            Arc::new(ReqwestAuthClient::new(backend_url.clone())),
            Arc::new(ReqwestTaskGateway::new(backend_url)),
        ))
    }

    pub fn with_services(
        bootstrap: BootstrapResult,
        credential_store: Arc<dyn CredentialStore>,
        auth_client: Arc<dyn AuthClient>,
        gateway: Arc<dyn TaskGateway>,
    ) -> Self {
        Self {
            workspace_root: bootstrap.workspace_root,
            config: bootstrap.config,
            logs_dir: bootstrap.logs_dir,
            session: SessionManager::new(credential_store, auth_client),
            gateway,
            now_provider: Arc::new(Utc::now),
            runtime: Mutex::new(RuntimeState::default()),
            log_guard: Mutex::new(()),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session_snapshot(&self) -> SessionContext {
        self.session.snapshot()
    }

    pub fn cached_tasks(&self) -> Vec<Task> {
        lock_runtime(self)
            .map(|runtime| runtime.tasks.clone())
            .unwrap_or_default()
    }

    fn now(&self) -> DateTime<Utc> {
        (self.now_provider)()
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

fn message_or(message: Option<String>, fallback: &str) -> String {
    message.unwrap_or_else(|| fallback.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub view: TaskListView,
    pub sort: SortOption,
    pub reversed_time_window: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardResponse {
    pub app_name: String,
    pub summary: DashboardSummary,
    pub view: TaskListView,
}

#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Outcome of a task mutation. `tasks` holds the refetched list, or `None`
/// when the mutation succeeded but the refetch did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub message: String,
    pub task: Option<Task>,
    pub tasks: Option<Vec<Task>>,
}

pub async fn login_impl(state: &AppState, email: String, password: String) -> Result<String, InfraError> {
    let message = state.session.login(&email, &password).await?;
    let context = state.session.snapshot();
    state.log_info("login", &format!("signed in as {}", email.trim()));
    Ok(message_or(
        message,
        &format!("Logged in as {}", context.display_name()),
    ))
}

pub async fn signup_impl(
    state: &AppState,
    name: String,
    email: String,
    password: String,
) -> Result<String, InfraError> {
    let message = state.session.register(&name, &email, &password).await?;
    state.log_info("signup", &format!("registered {}", email.trim()));
    Ok(message_or(message, "Account created"))
}

pub async fn logout_impl(state: &AppState) -> Result<String, InfraError> {
    let message = state.session.logout().await?;
    state.log_info("logout", "cleared stored session");
    Ok(message_or(message, "Logged out"))
}

pub async fn profile_impl(state: &AppState) -> Result<UserProfile, InfraError> {
    let context = state.session.restore().await?;
    let user = context.user.ok_or(InfraError::AuthenticationRequired)?;
    state.log_info("profile", "loaded user data");
    Ok(user)
}

/// Blank fields keep the current value, the way the profile form starts
/// pre-filled.
pub async fn update_profile_impl(
    state: &AppState,
    name: Option<String>,
    email: Option<String>,
) -> Result<ProfileChange, InfraError> {
    let current = profile_impl(state).await?;
    let name = name
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(current.name);
    let email = email
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(current.email);

    let change = state.session.update_profile(&name, &email).await?;
    state.log_info("update_profile", "updated user data");
    Ok(change)
}

pub async fn change_password_impl(
    state: &AppState,
    current_password: String,
    new_password: String,
    confirm_password: String,
) -> Result<String, InfraError> {
    let message = state
        .session
        .change_password(&current_password, &new_password, &confirm_password)
        .await?;
    state.log_info("change_password", "password changed; session cleared");
    Ok(message_or(message, "Password changed. Please log in again."))
}

pub async fn request_password_reset_impl(state: &AppState, email: String) -> Result<String, InfraError> {
    let message = state.session.send_reset_otp(&email).await?;
    state.log_info("request_password_reset", &format!("reset code requested for {}", email.trim()));
    Ok(message_or(message, "Reset code sent"))
}

pub async fn reset_password_impl(
    state: &AppState,
    email: String,
    otp: String,
    new_password: String,
) -> Result<String, InfraError> {
    let message = state.session.reset_password(&email, &otp, &new_password).await?;
    state.log_info("reset_password", &format!("password reset for {}", email.trim()));
    Ok(message_or(message, "Password has been reset"))
}

async fn refresh_tasks(state: &AppState, token: &SessionToken) -> Result<Vec<Task>, InfraError> {
    let tasks = state.gateway.list_tasks(token).await?;
    lock_runtime(state)?.tasks = tasks.clone();
    tracing::debug!(count = tasks.len(), "task list refreshed");
    Ok(tasks)
}

pub async fn dashboard_impl(state: &AppState) -> Result<DashboardResponse, InfraError> {
    let context = state.session.restore().await?;
    if !context.logged_in {
        return Err(InfraError::AuthenticationRequired);
    }
    let token = state.session.require_token()?;
    let tasks = refresh_tasks(state, &token).await?;

    let now = state.now();
    let tz = state.config.timezone;
    let response = DashboardResponse {
        app_name: state.config.app_name.clone(),
        summary: DashboardSummary::build(context.display_name(), &tasks, now, &tz),
        view: TaskListView::build(&tasks, &TaskFilter::default(), SortOption::Default, now, &tz),
    };
    state.log_info("dashboard", &format!("loaded {} tasks", tasks.len()));
    Ok(response)
}

pub async fn list_tasks_impl(state: &AppState, query: TaskListQuery) -> Result<TaskListResponse, InfraError> {
    let filter = TaskFilter::parse(
        query.from.as_deref(),
        query.to.as_deref(),
        query.start_time.as_deref(),
        query.end_time.as_deref(),
    )
    .map_err(InfraError::Validation)?;
    let sort = match query.sort.as_deref() {
        Some(raw) => raw.parse::<SortOption>().map_err(InfraError::Validation)?,
        None => SortOption::Default,
    };

    let token = state.session.require_token()?;
    let tasks = refresh_tasks(state, &token).await?;
    let view = TaskListView::build(&tasks, &filter, sort, state.now(), &state.config.timezone);

    state.log_info(
        "list_tasks",
        &format!("listed {} of {} tasks sort={sort}", view.matched, tasks.len()),
    );
    Ok(TaskListResponse {
        view,
        sort,
        reversed_time_window: filter.has_reversed_time_window(),
    })
}

/// Refetches the full list after a successful mutation. A failed refetch
/// does not undo the mutation.
async fn finish_mutation(
    state: &AppState,
    command: &str,
    token: &SessionToken,
    mutation: TaskMutation,
    fallback: &str,
) -> MutationOutcome {
    let tasks = match refresh_tasks(state, token).await {
        Ok(tasks) => Some(tasks),
        Err(error) => {
            tracing::warn!(%error, command, "mutation succeeded but refetch failed");
            state.log_error(command, &format!("refetch failed: {error}"));
            None
        }
    };
    MutationOutcome {
        message: message_or(mutation.message, fallback),
        task: mutation.task,
        tasks,
    }
}

pub async fn create_task_impl(state: &AppState, input: TaskInput) -> Result<MutationOutcome, InfraError> {
    let mut form = TaskForm::new();
    if let Some(title) = input.title {
        form.title = title;
    }
    if let Some(description) = input.description {
        form.description = description;
    }
    if let Some(date) = input.date {
        form.due_date = date;
    }
    if let Some(time) = input.time {
        form.due_time = time;
    }
    let draft = form
        .submit(&state.config.timezone)
        .map_err(InfraError::Validation)?;

    let token = state.session.require_token()?;
    let mutation = state.gateway.create_task(&token, &draft).await?;
    state.log_info("create_task", &format!("created task title={}", draft.title));
    Ok(finish_mutation(state, "create_task", &token, mutation, "Task created").await)
}

/// Starts from the stored task (edit mode) and overrides only the given fields.
pub async fn edit_task_impl(
    state: &AppState,
    task_id: String,
    input: TaskInput,
) -> Result<MutationOutcome, InfraError> {
    let task_id = task_id.trim().to_string();
    if task_id.is_empty() {
        return Err(InfraError::Validation("task id must not be empty".to_string()));
    }

    let token = state.session.require_token()?;
    let tasks = refresh_tasks(state, &token).await?;
    let existing = tasks
        .iter()
        .find(|task| task.id == task_id)
        .ok_or_else(|| InfraError::Validation(format!("task not found: {task_id}")))?;

    let tz = state.config.timezone;
    let mut form = TaskForm::from_task(existing, &tz);
    if let Some(title) = input.title {
        form.title = title;
    }
    if let Some(description) = input.description {
        form.description = description;
    }
    if let Some(date) = input.date {
        form.due_date = date;
    }
    if let Some(time) = input.time {
        form.due_time = time;
    }
    let draft = form.submit(&tz).map_err(InfraError::Validation)?;

    let mutation = state.gateway.update_task(&token, &task_id, &draft).await?;
    state.log_info("edit_task", &format!("updated task_id={task_id}"));
    Ok(finish_mutation(state, "edit_task", &token, mutation, "Task updated").await)
}

pub async fn complete_task_impl(state: &AppState, task_id: String) -> Result<MutationOutcome, InfraError> {
    let token = state.session.require_token()?;
    let mutation = state.gateway.complete_task(&token, &task_id).await?;
    state.log_info("complete_task", &format!("completed task_id={}", task_id.trim()));
    Ok(finish_mutation(state, "complete_task", &token, mutation, "Task marked as done").await)
}

pub async fn delete_task_impl(state: &AppState, task_id: String) -> Result<MutationOutcome, InfraError> {
    let token = state.session.require_token()?;
    let mutation = state.gateway.delete_task(&token, &task_id).await?;
    state.log_info("delete_task", &format!("deleted task_id={}", task_id.trim()));
    Ok(finish_mutation(state, "delete_task", &token, mutation, "Task deleted").await)
}
