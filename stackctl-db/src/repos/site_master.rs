//! Tenant/site configuration lookup.

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{error, info};

use crate::error::DbError;
use crate::pool::Database;
use crate::repos::{row_to_map, RowMap};
use crate::retry::retry_query;

/// Read seam for tenant/site configuration, so consumers can be tested
/// without a live database.
#[async_trait]
pub trait SiteLookup: Send + Sync {
    /// Fetch a site master record, `None` when no row matches.
    async fn get_by_id(&self, site_master_id: &str) -> Result<Option<RowMap>, DbError>;
}

const SELECT_SITE_MASTER_BY_ID: &str = "SELECT * FROM SITE_MASTER WHERE SITE_MASTER_ID = ?";

/// Site master repository.
pub struct SiteMasterRepo<'a> {
    db: &'a Database,
}

impl<'a> SiteMasterRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Fetch the site master row keyed by `site_master_id`.
    ///
    /// The identifier is a bound parameter. Absence is `Ok(None)`, never an
    /// error; classified errors from the executor propagate unchanged after
    /// being logged.
    pub async fn get_by_id(&self, site_master_id: &str) -> Result<Option<RowMap>, DbError> {
        let mut conn = self.db.acquire().await?;
        // Each attempt's future owns the bound identifier.
        let id = site_master_id.to_owned();
        let row = retry_query(&mut *conn, move |conn| {
            let id = id.clone();
            async move {
                sqlx::query(SELECT_SITE_MASTER_BY_ID)
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await
            }
            .boxed()
        })
        .await
        .map_err(|err| {
            error!(site_master_id, "error fetching site master: {err}");
            err
        })?;
        match row {
            Some(row) => {
                info!(site_master_id, "found site master");
                Ok(Some(row_to_map(&row)))
            }
            None => {
                info!(site_master_id, "no site master found");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SiteLookup for SiteMasterRepo<'_> {
    async fn get_by_id(&self, site_master_id: &str) -> Result<Option<RowMap>, DbError> {
        SiteMasterRepo::get_by_id(self, site_master_id).await
    }
}
