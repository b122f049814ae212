use crate::error::SyncError;
use crate::models::{Task, TaskDraft, TaskId};
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::time::Duration;

/// Remote store holding the authoritative task list.
pub trait TaskStore: Send + Sync + 'static {
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, SyncError>> + Send;

    fn create(&self, draft: &TaskDraft) -> impl Future<Output = Result<(), SyncError>> + Send;

    fn complete(&self, id: &TaskId) -> impl Future<Output = Result<(), SyncError>> + Send;

    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Task store reached over the `/api/tasks` REST endpoints.
#[derive(Clone, Debug)]
pub struct HttpTaskStore {
    client: Client,
    base_url: String,
}

impl HttpTaskStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTaskStore {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn check_status(res: Response, id: Option<&TaskId>) -> Result<Response, SyncError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(SyncError::NotFound(id.clone()));
        }
    }
    let body = res.text().await.unwrap_or_default();
    Err(SyncError::Server {
        status: status.as_u16(),
        body,
    })
}

impl TaskStore for HttpTaskStore {
    async fn list(&self) -> Result<Vec<Task>, SyncError> {
        let url = format!("{}/api/tasks", self.base_url);

        let res = self.client.get(&url).send().await?;
        let body = check_status(res, None).await?.text().await?;
        let tasks = serde_json::from_str::<Vec<Task>>(&body)?;

        Ok(tasks)
    }

    async fn create(&self, draft: &TaskDraft) -> Result<(), SyncError> {
        let url = format!("{}/api/tasks", self.base_url);

        let res = self.client.post(&url).json(draft).send().await?;
        check_status(res, None).await?;

        Ok(())
    }

    async fn complete(&self, id: &TaskId) -> Result<(), SyncError> {
        let url = format!("{}/api/tasks/{}/complete", self.base_url, id);

        let res = self.client.post(&url).send().await?;
        check_status(res, Some(id)).await?;

        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), SyncError> {
        let url = format!("{}/api/tasks/{}/delete", self.base_url, id);

        let res = self.client.delete(&url).send().await?;
        check_status(res, Some(id)).await?;

        Ok(())
    }
}
