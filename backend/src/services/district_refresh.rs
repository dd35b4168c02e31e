//! Round-robin refresh of the per-district cache
//!
//! Each run visits one district, chosen by a persisted cursor, and then moves
//! the cursor a fixed step forward. The cursor advances whether the visit
//! succeeded, was skipped or failed: a district that keeps failing is simply
//! retried when the rotation comes back to it.

use chrono::{DateTime, Utc};
use shared::{date_offset_from, DistrictDocument};
use std::sync::Arc;

use crate::config::RefreshConfig;
use crate::error::AppResult;
use crate::services::districts::DistrictCatalog;
use crate::services::location::LocationDataProvider;
use crate::store::{DistrictCache, StoreError};

/// Fixed-step rotation over `1..=total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobin {
    pub step: u32,
    pub total: u32,
}

impl RoundRobin {
    pub fn new(step: u32, total: u32) -> Self {
        Self { step, total }
    }

    /// Position after `cursor`, wrapped into `1..=total`
    pub fn next(&self, cursor: u32) -> u32 {
        if self.total == 0 {
            return cursor;
        }
        let zero_based = i64::from(cursor) - 1 + i64::from(self.step);
        // rem_euclid keeps a stray cursor of 0 inside the range
        (zero_based.rem_euclid(i64::from(self.total)) + 1) as u32
    }
}

/// What happened to the visited district
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Cache already holds today's data; nothing fetched
    AlreadyFresh,
    /// New data written
    Updated,
    /// Provider returned no data; cache untouched
    NoData,
    /// Visit failed; the error was logged
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub cursor: u32,
    pub district_id: Option<String>,
    pub outcome: RefreshOutcome,
    pub next_cursor: u32,
}

pub struct DistrictRefreshJob {
    cache: DistrictCache,
    catalog: Arc<DistrictCatalog>,
    provider: Arc<dyn LocationDataProvider>,
    step: u32,
    default_cursor: u32,
}

impl DistrictRefreshJob {
    pub fn new(
        cache: DistrictCache,
        catalog: Arc<DistrictCatalog>,
        provider: Arc<dyn LocationDataProvider>,
        config: &RefreshConfig,
    ) -> Self {
        Self {
            cache,
            catalog,
            provider,
            step: config.step,
            default_cursor: config.default_cursor,
        }
    }

    pub async fn run_once(&self) -> Result<RefreshSummary, StoreError> {
        self.run_once_at(Utc::now()).await
    }

    /// One invocation: visit the district under the cursor, then advance the
    /// cursor. Only a failure to persist the cursor is returned as an error.
    pub async fn run_once_at(&self, now: DateTime<Utc>) -> Result<RefreshSummary, StoreError> {
        let cursor = match self.cache.cursor().await {
            Ok(Some(cursor)) => cursor,
            Ok(None) => self.default_cursor,
            Err(e) => {
                tracing::error!("Error reading refresh cursor: {}", e);
                self.default_cursor
            }
        };

        let district_id = self
            .catalog
            .district(cursor)
            .ok()
            .map(|district| district.id.clone());

        let outcome = match self.refresh_district(cursor, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error processing district {}: {}", cursor, e);
                RefreshOutcome::Failed(e.to_string())
            }
        };

        let policy = RoundRobin::new(self.step, self.catalog.len() as u32);
        let next_cursor = policy.next(cursor);
        self.cache.put_cursor(next_cursor).await?;

        tracing::info!(
            "Refresh run finished: district {} -> {:?}, next cursor {}",
            cursor,
            outcome,
            next_cursor
        );

        Ok(RefreshSummary {
            cursor,
            district_id,
            outcome,
            next_cursor,
        })
    }

    async fn refresh_district(&self, cursor: u32, now: DateTime<Utc>) -> AppResult<RefreshOutcome> {
        let district = self.catalog.district(cursor)?;
        let today = date_offset_from(now, 0);

        if let Some(previous) = self.cache.district(&district.id).await? {
            if previous.is_current(&today) {
                tracing::info!("District {} already has the latest data.", district.name);
                return Ok(RefreshOutcome::AlreadyFresh);
            }
        }

        let Some(record) = self.provider.location_data(district.centroid).await? else {
            tracing::warn!("Skipping district {} due to missing data.", district.name);
            return Ok(RefreshOutcome::NoData);
        };

        let document = DistrictDocument::new(
            district.id.clone(),
            district.name.clone(),
            district.centroid,
            record,
            today,
        );
        self.cache.put_district(&document).await?;

        Ok(RefreshOutcome::Updated)
    }
}
