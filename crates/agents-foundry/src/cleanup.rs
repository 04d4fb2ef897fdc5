//! Bulk cleanup of every agent or thread visible to the caller.
//!
//! Always re-reads the first page after deleting, since deletions shift the
//! listing. Stops once the final page (`has_more = false`) has been processed,
//! or when the listing stops shrinking. An empty page that still claims
//! `has_more` is re-read, never taken as the end.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::{AgentsApi, ListQuery, ResourceKind};
use crate::error::{FoundryError, FoundryResult};

pub const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub deleted: usize,
    pub failed: usize,
    /// Listing requests issued.
    pub pages: usize,
}

pub struct BulkCleanup {
    api: Arc<dyn AgentsApi>,
    query: ListQuery,
    max_pages: usize,
}

impl BulkCleanup {
    pub fn new(api: Arc<dyn AgentsApi>) -> Self {
        Self {
            api,
            query: ListQuery::default(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_page_size(mut self, limit: u32) -> Self {
        self.query.limit = limit.max(1);
        self
    }

    /// Delete every resource of `kind`. Individual deletion failures are
    /// counted; listing failures abort the purge.
    #[instrument(skip(self))]
    pub async fn purge_all(&self, kind: ResourceKind) -> FoundryResult<PurgeReport> {
        let mut report = PurgeReport::default();
        // Ids of the last page on which nothing could be deleted.
        let mut stuck: Option<Vec<String>> = None;

        loop {
            if report.pages >= self.max_pages {
                warn!(%kind, pages = report.pages, "page budget exhausted");
                return Err(FoundryError::PurgeStalled { kind, report });
            }

            let page = self.api.list(kind, self.query).await?;
            report.pages += 1;
            let ids: Vec<String> = page.data.into_iter().map(|r| r.id).collect();
            if ids.is_empty() && !page.has_more {
                break;
            }
            // Two empty `has_more` pages in a row also count as stuck.
            if stuck.as_ref() == Some(&ids) {
                warn!(%kind, pages = report.pages, "listing is not shrinking");
                return Err(FoundryError::PurgeStalled { kind, report });
            }

            let mut deleted_here = 0;
            for id in &ids {
                match self.api.delete(kind, id).await {
                    Ok(()) => {
                        info!(%kind, %id, "Deleted");
                        deleted_here += 1;
                    }
                    Err(err) => {
                        warn!(%kind, %id, error = %err, "Failed to delete");
                        report.failed += 1;
                    }
                }
            }
            report.deleted += deleted_here;

            if !page.has_more {
                break;
            }
            stuck = (deleted_here == 0).then_some(ids);
        }

        info!(
            %kind,
            deleted = report.deleted,
            failed = report.failed,
            pages = report.pages,
            "purge finished"
        );
        Ok(report)
    }
}
