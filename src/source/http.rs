//! Live coordinator source over HTTP.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::{DataSource, SourceEvent};
use crate::coordinator::{Command, CoordinatorClient};

/// A data source that talks to a live coordinator.
///
/// Every request runs as its own task on the given runtime and reports back
/// over an unbounded channel, so a slow poll never holds up a command or the
/// UI thread. Nothing is retried.
#[derive(Debug)]
pub struct HttpSource {
    client: CoordinatorClient,
    runtime: Handle,
    sender: mpsc::UnboundedSender<SourceEvent>,
    receiver: mpsc::UnboundedReceiver<SourceEvent>,
    description: String,
}

impl HttpSource {
    pub fn new(client: CoordinatorClient, runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let description = format!("coordinator: {}", client.endpoint());
        Self {
            client,
            runtime,
            sender,
            receiver,
            description,
        }
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = SourceEvent> + Send + 'static,
    {
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            // Receiver gone means the app is shutting down
            let _ = sender.send(request.await);
        });
    }
}

impl DataSource for HttpSource {
    fn request_clusters(&mut self) {
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.list_clusters().await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, "failed to list clusters");
            }
            SourceEvent::Clusters(result)
        });
    }

    fn request_overview(&mut self, cluster: &str) {
        let client = self.client.clone();
        let cluster = cluster.to_string();
        self.spawn(async move {
            let result = client.overview(&cluster).await;
            if let Err(e) = &result {
                tracing::warn!(%cluster, error = %e, "failed to load overview");
            }
            SourceEvent::Overview { cluster, result }
        });
    }

    fn request_stats(&mut self, cluster: &str) {
        let client = self.client.clone();
        let cluster = cluster.to_string();
        self.spawn(async move {
            let result = client.stats(&cluster).await;
            if let Err(e) = &result {
                tracing::debug!(%cluster, error = %e, "stats poll failed");
            }
            SourceEvent::Stats { cluster, result }
        });
    }

    fn submit(&mut self, cluster: &str, command: Command) {
        let client = self.client.clone();
        let cluster = cluster.to_string();
        self.spawn(async move {
            let result = client.execute(&cluster, &command).await;
            match &result {
                Ok(()) => tracing::info!(%cluster, %command, "command succeeded"),
                Err(e) => tracing::warn!(%cluster, %command, error = %e, "command failed"),
            }
            SourceEvent::CommandDone {
                cluster,
                command,
                result,
            }
        });
    }

    fn poll(&mut self) -> Option<SourceEvent> {
        self.receiver.try_recv().ok()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::coordinator::CoordinatorError;

    fn unreachable_source() -> HttpSource {
        let client = CoordinatorClient::builder()
            .endpoint("http://127.0.0.1:1")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        HttpSource::new(client, Handle::current())
    }

    async fn next_event(source: &mut HttpSource) -> SourceEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(event) = source.poll() {
                    return event;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_description() {
        let source = unreachable_source();
        assert_eq!(source.description(), "coordinator: http://127.0.0.1:1/");
    }

    #[tokio::test]
    async fn test_poll_is_empty_without_requests() {
        let mut source = unreachable_source();
        assert!(source.poll().is_none());
    }

    #[tokio::test]
    async fn test_stats_failure_is_tagged_with_cluster() {
        let mut source = unreachable_source();
        source.request_stats("demo");

        match next_event(&mut source).await {
            SourceEvent::Stats { cluster, result } => {
                assert_eq!(cluster, "demo");
                assert!(result.is_err());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_failure_keeps_command() {
        let mut source = unreachable_source();
        source.submit("demo", Command::ResyncAllGroups);

        match next_event(&mut source).await {
            SourceEvent::CommandDone {
                cluster,
                command,
                result,
            } => {
                assert_eq!(cluster, "demo");
                assert_eq!(command, Command::ResyncAllGroups);
                assert!(!matches!(result, Ok(()) | Err(CoordinatorError::ReadOnly(_))));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
