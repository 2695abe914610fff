use common::{Assignment, CompletionReport, JobConfig, Phase, TaskId, TaskReply};
use reqwest::{Client, Response};
use std::time::Duration;

use crate::error::WorkerError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cliente de la API del coordinator (`/info`, `/task`, `POST /`).
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    http: Client,
    base_url: String,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WorkerError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `http://<host>:<port>`
    pub fn for_port(host: &str, port: u16) -> Result<Self, WorkerError> {
        Self::new(format!("http://{}:{}", host, port))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn job_info(&self) -> Result<JobConfig, WorkerError> {
        let url = format!("{}/info", self.base_url);
        let resp = check_status(self.http.get(&url).send().await?)?;
        let job: JobConfig = resp.json().await?;
        Ok(job.validated()?)
    }

    pub async fn next_task(&self) -> Result<Assignment, WorkerError> {
        let url = format!("{}/task", self.base_url);
        let resp = check_status(self.http.get(&url).send().await?)?;
        let reply: TaskReply = resp.json().await?;
        Ok(Assignment::try_from(reply)?)
    }

    pub async fn report_done(&self, phase: Phase, id: TaskId) -> Result<(), WorkerError> {
        let url = format!("{}/", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&CompletionReport::new(phase, id))
            .send()
            .await?;
        check_status(resp)?;
        Ok(())
    }
}

fn check_status(resp: Response) -> Result<Response, WorkerError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(WorkerError::Status(resp.status()))
    }
}
