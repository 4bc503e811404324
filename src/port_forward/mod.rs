//! Long-lived `kubectl port-forward` sessions.
//!
//! Each session owns a child process and a monitor task. Sessions are
//! removed from the table when stopped, so a second stop of the same id
//! reports an unknown session.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How long a fresh session gets to survive before we call it started.
const START_GRACE: Duration = Duration::from_millis(500);
const MONITOR_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum PortForwardError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Port forward failed to start: {0}")]
    StartFailed(String),
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Starting,
    Active,
    Stopped,
    Failed,
}

/// Public view of a forwarding session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub resource_type: String,
    pub resource_name: String,
    pub namespace: String,
    pub local_port: u16,
    pub remote_port: u16,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

struct Session {
    info: SessionInfo,
    child: Option<Child>,
}

type SessionTable = Arc<Mutex<HashMap<String, Session>>>;

pub struct PortForwardManager {
    kubectl_path: String,
    sessions: SessionTable,
}

impl PortForwardManager {
    pub fn new(kubectl_path: impl Into<String>) -> Self {
        Self {
            kubectl_path: kubectl_path.into(),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start forwarding `local_port` to `remote_port` on the given resource.
    /// Returns only after the child has survived a short grace period.
    pub async fn start(
        &self,
        resource_type: &str,
        resource_name: &str,
        namespace: &str,
        local_port: u16,
        remote_port: u16,
    ) -> Result<SessionInfo, PortForwardError> {
        let target = format!("{resource_type}/{resource_name}");
        let mut child = Command::new(&self.kubectl_path)
            .arg("port-forward")
            .arg(&target)
            .arg(format!("{local_port}:{remote_port}"))
            .arg("-n")
            .arg(namespace)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PortForwardError::Spawn {
                command: self.kubectl_path.clone(),
                source,
            })?;

        tokio::time::sleep(START_GRACE).await;
        if let Ok(Some(status)) = child.try_wait() {
            let mut detail = String::new();
            if let Some(mut stderr) = child.stderr.take() {
                let _ = stderr.read_to_string(&mut detail).await;
            }
            let detail = if detail.trim().is_empty() {
                format!("kubectl exited with {status}")
            } else {
                detail.trim().to_string()
            };
            return Err(PortForwardError::StartFailed(detail));
        }

        let id = Uuid::new_v4().to_string();
        let info = SessionInfo {
            id: id.clone(),
            resource_type: resource_type.to_string(),
            resource_name: resource_name.to_string(),
            namespace: namespace.to_string(),
            local_port,
            remote_port,
            status: SessionStatus::Active,
            created_at: Utc::now(),
        };

        self.sessions.lock().await.insert(
            id.clone(),
            Session {
                info: info.clone(),
                child: Some(child),
            },
        );

        info!(
            "Port forward {} active: {} {}:{} in {}",
            id, target, local_port, remote_port, namespace
        );

        let table = Arc::clone(&self.sessions);
        tokio::spawn(monitor(table, id));

        Ok(info)
    }

    /// Stop a session and forget it. The id is not reusable afterwards.
    pub async fn stop(&self, id: &str) -> Result<SessionInfo, PortForwardError> {
        let mut session = self
            .sessions
            .lock()
            .await
            .remove(id)
            .ok_or_else(|| PortForwardError::SessionNotFound(id.to_string()))?;

        if let Some(mut child) = session.child.take() {
            if let Err(e) = child.kill().await {
                debug!("Port forward {} kill: {}", id, e);
            }
            let _ = child.wait().await;
        }

        session.info.status = SessionStatus::Stopped;
        info!("Port forward {} stopped", id);
        Ok(session.info)
    }

    pub async fn list(&self) -> Vec<SessionInfo> {
        self.sessions
            .lock()
            .await
            .values()
            .map(|s| s.info.clone())
            .collect()
    }

    /// Kill everything, used on shutdown.
    pub async fn stop_all(&self) {
        let mut sessions = self.sessions.lock().await;
        for (id, session) in sessions.iter_mut() {
            if let Some(mut child) = session.child.take() {
                if let Err(e) = child.kill().await {
                    debug!("Port forward {} kill: {}", id, e);
                }
            }
        }
        sessions.clear();
    }
}

/// Watch the child until it exits or the session is stopped.
fn mark_failed(session: &mut Session) {
    session.info.status = SessionStatus::Failed;
    session.child = None;
}

async fn monitor(table: SessionTable, id: String) {
    loop {
        tokio::time::sleep(MONITOR_INTERVAL).await;
        let mut sessions = table.lock().await;
        let session = match sessions.get_mut(&id) {
            Some(session) => session,
            // Removed by stop()
            None => return,
        };
        let child = match session.child.as_mut() {
            Some(child) => child,
            None => return,
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                warn!("Port forward {} exited unexpectedly: {}", id, status);
                mark_failed(session);
                return;
            }
            Ok(None) => {}
            Err(e) => {
                // The child is unobservable from here on; don't leave the
                // session advertised as active
                warn!("Port forward {} monitor error: {}", id, e);
                mark_failed(session);
                return;
            }
        }
    }
}
