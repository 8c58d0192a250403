//! The `challenges` data source: one ordered snapshot of the whole catalog.

use std::pin::pin;
use std::sync::Arc;

use ctfsync_client::CatalogApi;
use ctfsync_core::{Challenge, ChallengeId, Diagnostic, Diagnostics, Severity, Snapshot};
use futures::StreamExt;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::context::ReadContext;
use crate::hydrate::hydrate;

/// Hydrations allowed in flight at once unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("no CTFd client was configured for this provider")]
    MissingClient,
}

impl ConfigureError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(Severity::Fatal, "Unconfigured CTFd Client", self.to_string())
    }
}

/// Result of one catalog read.
///
/// `snapshot` is `None` when the read could not produce a trustworthy list
/// (listing failed, or the read was cancelled); `diagnostics` then holds the
/// fatal reason.
#[derive(Debug, Clone)]
pub struct SnapshotRead {
    pub snapshot: Option<Snapshot>,
    pub diagnostics: Diagnostics,
}

impl SnapshotRead {
    pub fn challenges(&self) -> &[Challenge] {
        self.snapshot
            .as_ref()
            .map(|s| s.challenges.as_slice())
            .unwrap_or(&[])
    }
}

pub(crate) fn cancelled_diagnostic(detail: String) -> Diagnostic {
    Diagnostic::new(Severity::Fatal, "Read Cancelled", detail)
}

/// Read-only view over every challenge of a CTFd instance.
pub struct ChallengesDataSource {
    client: Arc<dyn CatalogApi>,
    concurrency: usize,
    partial_on_cancel: bool,
}

impl ChallengesDataSource {
    pub fn new(client: Arc<dyn CatalogApi>) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            partial_on_cancel: false,
        }
    }

    /// Build the data source from whatever the provider handed over.
    pub fn configure(provider_data: Option<Arc<dyn CatalogApi>>) -> Result<Self, ConfigureError> {
        provider_data
            .map(Self::new)
            .ok_or(ConfigureError::MissingClient)
    }

    /// Type name under a given provider, e.g. `ctfd_challenges`.
    pub fn type_name(provider: &str) -> String {
        format!("{provider}_challenges")
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// On cancellation, return the challenges hydrated so far instead of none.
    pub fn partial_on_cancel(mut self, keep: bool) -> Self {
        self.partial_on_cancel = keep;
        self
    }

    /// List every challenge and hydrate each one.
    ///
    /// Challenges come back in list order. A challenge whose hydration hit
    /// problems is still part of the snapshot; its diagnostics reference it.
    pub async fn read(&self, ctx: &ReadContext) -> SnapshotRead {
        let mut diagnostics = Diagnostics::new();

        if ctx.is_cancelled() {
            diagnostics.push(cancelled_diagnostic(
                "read cancelled before the challenge list was fetched".into(),
            ));
            return SnapshotRead {
                snapshot: None,
                diagnostics,
            };
        }

        let listed = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                warn!("challenge read cancelled while listing");
                diagnostics.push(cancelled_diagnostic(
                    "read cancelled while fetching the challenge list".into(),
                ));
                return SnapshotRead { snapshot: None, diagnostics };
            }
            listed = self.client.list_challenges() => listed,
        };
        let stubs = match listed {
            Ok(stubs) => stubs,
            Err(err) => {
                error!(error = %err, "unable to list challenges");
                diagnostics.add_fatal("Unable to Read CTFd Challenges", err.to_string());
                return SnapshotRead {
                    snapshot: None,
                    diagnostics,
                };
            }
        };

        let total = stubs.len();
        let mut challenges = Vec::with_capacity(total);
        let client = &*self.client;
        let mut hydrations = pin!(
            futures::stream::iter(stubs)
                .map(|stub| hydrate(client, ChallengeId(stub.id)))
                .buffered(self.concurrency)
        );

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    warn!(hydrated = challenges.len(), total, "challenge read cancelled");
                    diagnostics.push(cancelled_diagnostic(format!(
                        "read cancelled after hydrating {} of {total} challenges",
                        challenges.len()
                    )));
                    let snapshot = self.partial_on_cancel.then(|| Snapshot::new(challenges));
                    return SnapshotRead { snapshot, diagnostics };
                }
                next = hydrations.next() => match next {
                    Some(hydration) => {
                        diagnostics.extend(hydration.diagnostics);
                        challenges.push(hydration.challenge);
                    }
                    None => break,
                },
            }
        }

        info!(
            count = challenges.len(),
            diagnostics = diagnostics.len(),
            "read challenges"
        );
        SnapshotRead {
            snapshot: Some(Snapshot::new(challenges)),
            diagnostics,
        }
    }
}
