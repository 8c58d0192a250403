//! Read path of the `challenge` resource.
//!
//! Mutations live with the host framework; this side only refreshes one
//! challenge from the remote catalog using the same hydration as the
//! data source.

use std::sync::Arc;

use ctfsync_client::CatalogApi;
use ctfsync_core::{Challenge, ChallengeId, Diagnostic, Diagnostics, Severity};
use tracing::info;

use crate::context::ReadContext;
use crate::hydrate::hydrate;
use crate::snapshot::{ConfigureError, cancelled_diagnostic};

/// Outcome of refreshing one challenge.
#[derive(Debug, Clone)]
pub enum ChallengeRead {
    Found {
        challenge: Challenge,
        diagnostics: Diagnostics,
    },
    /// The challenge no longer exists remotely and should leave state.
    Removed,
    Cancelled(Diagnostics),
}

pub struct ChallengeResource {
    client: Arc<dyn CatalogApi>,
}

impl ChallengeResource {
    pub fn new(client: Arc<dyn CatalogApi>) -> Self {
        Self { client }
    }

    pub fn configure(provider_data: Option<Arc<dyn CatalogApi>>) -> Result<Self, ConfigureError> {
        provider_data
            .map(Self::new)
            .ok_or(ConfigureError::MissingClient)
    }

    pub fn type_name(provider: &str) -> String {
        format!("{provider}_challenge")
    }

    /// Parse the identifier given on import.
    pub fn parse_import_id(raw: &str) -> Result<ChallengeId, Diagnostic> {
        raw.parse().map_err(|e| {
            Diagnostic::new(
                Severity::Error,
                "Invalid Import ID",
                format!("expected a numeric challenge id, got {raw:?}: {e}"),
            )
        })
    }

    pub async fn read(&self, ctx: &ReadContext, id: ChallengeId) -> ChallengeRead {
        let mut diagnostics = Diagnostics::new();
        if ctx.is_cancelled() {
            diagnostics.push(cancelled_diagnostic(format!(
                "read of challenge {id} cancelled before it started"
            )));
            return ChallengeRead::Cancelled(diagnostics);
        }

        let hydration = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                diagnostics.push(cancelled_diagnostic(format!("read of challenge {id} cancelled")));
                return ChallengeRead::Cancelled(diagnostics);
            }
            hydration = hydrate(&*self.client, id) => hydration,
        };

        if hydration.missing {
            info!(challenge = %id, "challenge no longer exists remotely");
            return ChallengeRead::Removed;
        }
        ChallengeRead::Found {
            challenge: hydration.challenge,
            diagnostics: hydration.diagnostics,
        }
    }
}
