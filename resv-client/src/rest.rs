use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use resv_core::client::ManagementClient;
use resv_core::config::EndpointConfig;
use resv_core::error::{ResvError, ResvResult};
use resv_core::types::{ReservationUpdate, TaskHandle, TaskState, VmRecord};

use crate::wire::{
    HostDetail, ReconfigureSpec, ReservationSpec, TaskInfo, VmDetail, VmSummary,
};

/// Session token header expected by the endpoint after login.
const SESSION_HEADER: &str = "x-api-session-id";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST implementation of [`ManagementClient`].
///
/// [`connect`](Self::connect) performs the session login; the returned
/// instance carries the session token and is used for the rest of the
/// run. No retries anywhere: a failed login is fatal, a failed request
/// surfaces as a transport error.
pub struct RestClient {
    http: Client,
    base_url: String,
    session_id: String,
}

impl RestClient {
    /// Open an authenticated session against the endpoint.
    #[instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub async fn connect(config: &EndpointConfig) -> ResvResult<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT);
        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(|e| ResvError::Internal {
            message: format!("failed to build HTTP client: {}", e),
        })?;

        let base_url = config.base_url();
        let response = http
            .post(format!("{}/api/session", base_url))
            .basic_auth(&config.user, Some(&config.password))
            .send()
            .await
            .map_err(|e| ResvError::Connection {
                host: config.host.clone(),
                details: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(ResvError::Connection {
                host: config.host.clone(),
                details: format!("session creation returned {}", response.status()),
            });
        }
        let session_id: String = response.json().await.map_err(|e| ResvError::Connection {
            host: config.host.clone(),
            details: format!("malformed session response: {}", e),
        })?;
        debug!("management session established");

        Ok(Self {
            http,
            base_url,
            session_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, operation: &str) -> ResvResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .header(SESSION_HEADER, &self.session_id)
            .send()
            .await
            .map_err(|e| transport(operation, e))?;
        let response = expect_success(response, operation).await?;
        response.json().await.map_err(|e| transport(operation, e))
    }
}

#[async_trait]
impl ManagementClient for RestClient {
    async fn list_vms(&self) -> ResvResult<Vec<VmRecord>> {
        let summaries: Vec<VmSummary> = self.get_json("/api/vcenter/vm", "list VMs").await?;
        debug!(count = summaries.len(), "inventory snapshot fetched");

        // The listing is shallow; reservations and the change version only
        // come with the per-VM detail view.
        let mut records = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let detail: VmDetail = self
                .get_json(
                    &format!("/api/vcenter/vm/{}", summary.vm),
                    "read VM detail",
                )
                .await?;
            records.push(detail.into_record(summary.vm));
        }
        Ok(records)
    }

    async fn host_cpu_mhz(&self, host_id: &str) -> ResvResult<u64> {
        let detail: HostDetail = self
            .get_json(&format!("/api/vcenter/host/{}", host_id), "read host detail")
            .await?;
        Ok(detail.cpu_total_mhz)
    }

    async fn submit_reconfigure(
        &self,
        vm_id: &str,
        update: &ReservationUpdate,
    ) -> ResvResult<TaskHandle> {
        let spec = ReconfigureSpec {
            change_version: update.change_version.clone(),
            cpu: ReservationSpec {
                reservation: update.cpu_reservation_mhz,
            },
            memory: ReservationSpec {
                reservation: update.memory_reservation_mb,
            },
        };

        let operation = "submit reconfiguration";
        let response = self
            .http
            .post(self.url(&format!("/api/vcenter/vm/{}/reconfigure", vm_id)))
            .header(SESSION_HEADER, &self.session_id)
            .json(&spec)
            .send()
            .await
            .map_err(|e| transport(operation, e))?;

        // A stale change version can be rejected synchronously.
        if response.status() == StatusCode::CONFLICT {
            return Err(ResvError::ConcurrentModification {
                vm: vm_id.to_string(),
            });
        }
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(ResvError::Validation {
                vm: vm_id.to_string(),
                message: body,
            });
        }
        let response = expect_success(response, operation).await?;
        let id: String = response.json().await.map_err(|e| transport(operation, e))?;
        Ok(TaskHandle { id })
    }

    async fn task_state(&self, task: &TaskHandle) -> ResvResult<TaskState> {
        let operation = "poll task";
        let response = self
            .http
            .get(self.url(&format!("/api/tasks/{}", task.id)))
            .header(SESSION_HEADER, &self.session_id)
            .send()
            .await
            .map_err(|e| transport(operation, e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ResvError::TaskLost {
                task: task.id.clone(),
            });
        }
        let response = expect_success(response, operation).await?;
        let info: TaskInfo = response.json().await.map_err(|e| transport(operation, e))?;
        Ok(info.into_state())
    }

    async fn disconnect(&self) -> ResvResult<()> {
        let operation = "delete session";
        let response = self
            .http
            .delete(self.url("/api/session"))
            .header(SESSION_HEADER, &self.session_id)
            .send()
            .await
            .map_err(|e| transport(operation, e))?;
        expect_success(response, operation).await?;
        debug!("management session released");
        Ok(())
    }
}

async fn expect_success(response: Response, operation: &str) -> ResvResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ResvError::Session {
            message: format!("session rejected during {}: {}", operation, body),
        });
    }
    Err(ResvError::Transport {
        operation: operation.to_string(),
        details: format!("{}: {}", status, body),
    })
}

fn transport(operation: &str, error: reqwest::Error) -> ResvError {
    ResvError::Transport {
        operation: operation.to_string(),
        details: error.to_string(),
    }
}
