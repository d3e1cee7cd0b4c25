use crate::domain::models::{SessionToken, Task, TaskDraft};
use crate::infrastructure::backend_http::{
    endpoint, ensure_non_empty, envelope_message, optional_field, parse_envelope, required_field,
    with_session,
};
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use url::Url;

/// What a mutation returns: the backend's confirmation message and, when the
/// backend echoes it, the affected task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMutation {
    pub message: Option<String>,
    pub task: Option<Task>,
}

#[async_trait]
pub trait TaskGateway: Send + Sync {
    async fn list_tasks(&self, session: &SessionToken) -> Result<Vec<Task>, InfraError>;

    async fn create_task(
        &self,
        session: &SessionToken,
        draft: &TaskDraft,
    ) -> Result<TaskMutation, InfraError>;

    async fn update_task(
        &self,
        session: &SessionToken,
        task_id: &str,
        draft: &TaskDraft,
    ) -> Result<TaskMutation, InfraError>;

    async fn complete_task(
        &self,
        session: &SessionToken,
        task_id: &str,
    ) -> Result<TaskMutation, InfraError>;

    async fn delete_task(
        &self,
        session: &SessionToken,
        task_id: &str,
    ) -> Result<TaskMutation, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTaskGateway {
    client: Client,
    base_url: Url,
}

impl ReqwestTaskGateway {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn tasks_endpoint(&self) -> Result<Url, InfraError> {
        endpoint(&self.base_url, &["tasks"])
    }

    fn task_endpoint(&self, task_id: &str) -> Result<Url, InfraError> {
        endpoint(&self.base_url, &["tasks", task_id.trim()])
    }

    fn done_endpoint(&self, task_id: &str) -> Result<Url, InfraError> {
        endpoint(&self.base_url, &["tasks", task_id.trim(), "done"])
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        action: &str,
        method: Method,
        url: Url,
        session: &SessionToken,
        body: Option<&B>,
    ) -> Result<serde_json::Value, InfraError> {
        tracing::debug!(action, %url, "sending task request");

        let mut request = with_session(self.client.request(method, url), session);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|error| InfraError::Http(format!("network error while {action}: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Http(format!("failed reading response while {action}: {error}")))?;
        tracing::debug!(action, status = status.as_u16(), "task response received");

        parse_envelope(action, status, &body)
    }

    /// Every listed task must carry an id and a title; later edits address tasks by id.
    fn task_list(envelope: &serde_json::Value) -> Result<Vec<Task>, InfraError> {
        let tasks: Vec<Task> = required_field(envelope, "tasks", "listing tasks")?;
        for task in &tasks {
            task.validate().map_err(|error| {
                InfraError::Http(format!("listing tasks: malformed task in response: {error}"))
            })?;
        }
        Ok(tasks)
    }

    fn mutation(envelope: &serde_json::Value, action: &str) -> Result<TaskMutation, InfraError> {
        Ok(TaskMutation {
            message: envelope_message(envelope),
            task: optional_field(envelope, "task", action)?,
        })
    }
}

#[async_trait]
impl TaskGateway for ReqwestTaskGateway {
    async fn list_tasks(&self, session: &SessionToken) -> Result<Vec<Task>, InfraError> {
        let envelope = self
            .send::<()>("listing tasks", Method::GET, self.tasks_endpoint()?, session, None)
            .await?;
        Self::task_list(&envelope)
    }

    async fn create_task(
        &self,
        session: &SessionToken,
        draft: &TaskDraft,
    ) -> Result<TaskMutation, InfraError> {
        draft.validate().map_err(InfraError::Validation)?;

        let envelope = self
            .send(
                "creating task",
                Method::POST,
                self.tasks_endpoint()?,
                session,
                Some(draft),
            )
            .await?;
        Self::mutation(&envelope, "creating task")
    }

    async fn update_task(
        &self,
        session: &SessionToken,
        task_id: &str,
        draft: &TaskDraft,
    ) -> Result<TaskMutation, InfraError> {
        ensure_non_empty(task_id, "task id")?;
        draft.validate().map_err(InfraError::Validation)?;

        let envelope = self
            .send(
                "updating task",
                Method::PUT,
                self.task_endpoint(task_id)?,
                session,
                Some(draft),
            )
            .await?;
        Self::mutation(&envelope, "updating task")
    }

    async fn complete_task(
        &self,
        session: &SessionToken,
        task_id: &str,
    ) -> Result<TaskMutation, InfraError> {
        ensure_non_empty(task_id, "task id")?;

        let envelope = self
            .send::<()>(
                "completing task",
                Method::PUT,
                self.done_endpoint(task_id)?,
                session,
                None,
            )
            .await?;
        Self::mutation(&envelope, "completing task")
    }

    async fn delete_task(
        &self,
        session: &SessionToken,
        task_id: &str,
    ) -> Result<TaskMutation, InfraError> {
        ensure_non_empty(task_id, "task id")?;

        let envelope = self
            .send::<()>(
                "deleting task",
                Method::DELETE,
                self.task_endpoint(task_id)?,
                session,
                None,
            )
            .await?;
        Self::mutation(&envelope, "deleting task")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn gateway() -> ReqwestTaskGateway {
        ReqwestTaskGateway::new(Url::parse("http://127.0.0.1:9/api/").expect("url"))
    }

    fn session() -> SessionToken {
        SessionToken {
            cookie: "token=abc".to_string(),
            stored_at: Utc::now(),
        }
    }

    #[test]
    fn routes_follow_resource_layout() {
        let gateway = gateway();
        assert_eq!(
            gateway.tasks_endpoint().expect("url").as_str(),
            "http://127.0.0.1:9/api/tasks"
        );
        assert_eq!(
            gateway.task_endpoint(" 65f0c2 ").expect("url").as_str(),
            "http://127.0.0.1:9/api/tasks/65f0c2"
        );
        assert_eq!(
            gateway.done_endpoint("65f0c2").expect("url").as_str(),
            "http://127.0.0.1:9/api/tasks/65f0c2/done"
        );
    }

    #[test]
    fn task_list_payload_uses_backend_ids() {
        let envelope = parse_envelope(
            "listing tasks",
            reqwest::StatusCode::OK,
            r#"{
                "success": true,
                "tasks": [
                    {"_id": "a1", "title": "Write report", "description": "Q3", "dueDate": "2024-01-01T09:00:00.000Z", "completed": false},
                    {"_id": "b2", "title": "Gym", "dueDate": "2024-01-02T18:30:00Z"}
                ]
            }"#,
        )
        .expect("envelope");
        let tasks = ReqwestTaskGateway::task_list(&envelope).expect("tasks");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "a1");
        assert_eq!(
            tasks[0].due_date,
            DateTime::parse_from_rfc3339("2024-01-01T09:00:00Z")
                .expect("datetime")
                .with_timezone(&Utc)
        );
        assert_eq!(tasks[1].description, "");
        assert!(!tasks[1].completed);
    }

    #[test]
    fn task_list_rejects_tasks_without_id_or_title() {
        let envelope = serde_json::json!({
            "success": true,
            "tasks": [
                {"_id": "a1", "title": "Write report", "dueDate": "2024-01-01T09:00:00Z"},
                {"_id": " ", "title": "Orphan", "dueDate": "2024-01-01T09:00:00Z"}
            ]
        });
        let error = ReqwestTaskGateway::task_list(&envelope).expect_err("blank id");
        assert!(matches!(error, InfraError::Http(ref message) if message.contains("task.id")));

        let envelope = serde_json::json!({
            "success": true,
            "tasks": [{"_id": "a1", "title": "", "dueDate": "2024-01-01T09:00:00Z"}]
        });
        assert!(ReqwestTaskGateway::task_list(&envelope).is_err());
    }

    #[test]
    fn mutation_reads_message_and_echoed_task() {
        let envelope = serde_json::json!({
            "success": true,
            "message": "Task marked as done",
            "task": {"_id": "a1", "title": "Write report", "description": "", "dueDate": "2024-01-01T09:00:00Z", "completed": true}
        });
        let mutation = ReqwestTaskGateway::mutation(&envelope, "completing task").expect("mutation");
        assert_eq!(mutation.message.as_deref(), Some("Task marked as done"));
        assert!(mutation.task.expect("task").completed);

        let bare = serde_json::json!({"success": true, "message": "Task deleted"});
        let mutation = ReqwestTaskGateway::mutation(&bare, "deleting task").expect("mutation");
        assert!(mutation.task.is_none());
    }

    #[tokio::test]
    async fn blank_ids_are_rejected_locally() {
        let gateway = gateway();
        let session = session();
        assert!(matches!(
            gateway.complete_task(&session, "  ").await,
            Err(InfraError::Validation(_))
        ));
        assert!(matches!(
            gateway.delete_task(&session, "").await,
            Err(InfraError::Validation(_))
        ));
    }
}
