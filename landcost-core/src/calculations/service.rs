use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::engine::{RecalculationReport, RecalculationRequest, Recalculator};
use super::RecalculationError;
use crate::db::CostRepository;
use crate::models::IndicatorEdit;

/// Shared entry point for every caller that recalculates.
///
/// Recalculations and bulk edits are serialized behind one lock, so a pass
/// never reads indicators another pass is about to rewrite.
pub struct CostService {
    repo: Arc<dyn CostRepository>,
    guard: Mutex<()>,
}

impl CostService {
    pub fn new(repo: Arc<dyn CostRepository>) -> Self {
        Self {
            repo,
            guard: Mutex::new(()),
        }
    }

    /// Read access for callers that only list or aggregate.
    pub fn repository(&self) -> &dyn CostRepository {
        self.repo.as_ref()
    }

    pub async fn recalculate(
        &self,
        request: RecalculationRequest,
    ) -> Result<RecalculationReport, RecalculationError> {
        self.apply_edits(request, &[]).await
    }

    /// Bulk input update: applies `edits` to the request's category and recalculates it.
    pub async fn apply_edits(
        &self,
        request: RecalculationRequest,
        edits: &[IndicatorEdit],
    ) -> Result<RecalculationReport, RecalculationError> {
        let _guard = self.guard.lock().await;
        debug!(category = %request.category, edits = edits.len(), "Acquired recalculation lock");
        Recalculator::new(self.repo.as_ref())
            .recalculate_with_edits(request, edits)
            .await
    }
}

impl From<Box<dyn CostRepository>> for CostService {
    fn from(repo: Box<dyn CostRepository>) -> Self {
        Self::new(Arc::from(repo))
    }
}
