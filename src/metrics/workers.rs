use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;

use super::status::HealthStatus;

/// Point-in-time view of the background job subsystem.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerSnapshot {
    pub worker_count: u64,
    pub queues: Vec<QueueInfo>,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueInfo {
    pub name: String,
    pub pending: u64,
    pub in_progress: u64,
}

impl WorkerSnapshot {
    /// Sentinel for "no job subsystem". A valid terminal state, not an
    /// error: the collector returns it when workers are unconfigured,
    /// unreachable, or excluded from the request.
    pub fn disabled() -> Self {
        Self {
            worker_count: 0,
            queues: Vec::new(),
            status: HealthStatus::Disabled,
        }
    }
}

/// Connects a `ConnectionManager` that auto-reconnects on failure.
///
/// `ConnectionManager` is cheaply cloneable — every clone shares the
/// same underlying multiplexed TCP connection.
pub async fn connect(url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(url)?;
    Ok(ConnectionManager::new(client).await?)
}

/// Polls the Redis-backed job subsystem (RQ key layout) for active
/// worker count and per-queue depth. The only component here allowed
/// to touch the network, and only under a deadline.
pub struct WorkerCollector {
    conn: Option<ConnectionManager>,
    queues: Vec<String>,
    timeout: Duration,
}

impl WorkerCollector {
    pub fn new(conn: ConnectionManager, queues: Vec<String>, timeout: Duration) -> Self {
        Self {
            conn: Some(conn),
            queues,
            timeout,
        }
    }

    /// Collector for deployments without a job subsystem.
    pub fn disabled() -> Self {
        Self {
            conn: None,
            queues: Vec::new(),
            timeout: Duration::ZERO,
        }
    }

    /// Query worker and queue state. Never fails: an absent, slow, or
    /// unreachable subsystem degrades to the disabled sentinel.
    pub async fn collect(&self) -> WorkerSnapshot {
        let Some(conn) = &self.conn else {
            return WorkerSnapshot::disabled();
        };

        match tokio::time::timeout(self.timeout, self.query(conn.clone())).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                warn!(error = %e, "worker metrics query failed, reporting disabled");
                WorkerSnapshot::disabled()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "worker metrics query timed out, reporting disabled"
                );
                WorkerSnapshot::disabled()
            }
        }
    }

    async fn query(&self, mut conn: ConnectionManager) -> redis::RedisResult<WorkerSnapshot> {
        let worker_count: u64 = conn.scard("rq:workers").await?;

        let mut queues = Vec::with_capacity(self.queues.len());
        for name in &self.queues {
            let pending: u64 = conn.llen(format!("rq:queue:{name}")).await?;
            let in_progress: u64 = conn.zcard(format!("rq:registry:started:{name}")).await?;
            queues.push(QueueInfo {
                name: name.clone(),
                pending,
                in_progress,
            });
        }

        Ok(WorkerSnapshot {
            worker_count,
            queues,
            status: HealthStatus::Good,
        })
    }
}
