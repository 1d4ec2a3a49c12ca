use super::pagination::{PageRequest, PaginationMeta};
use super::predicate::Predicate;
use crate::store::{StoreSession, TripStore, single_count};
use crate::utils::arrow::batches_to_json;
use common::{Error, Result};
use serde_json::Value;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct TripPage {
    pub rows: Vec<Value>,
    pub pagination: PaginationMeta,
}

/// Runs a filtered page query and its matching count against one scoped
/// store session.
pub struct QueryExecutor<'a> {
    store: &'a TripStore,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a TripStore) -> Self {
        Self { store }
    }

    pub async fn fetch_page(&self, predicate: &Predicate, page: PageRequest) -> Result<TripPage> {
        let session = self.store.open().await?;

        let outcome = async {
            let rows = self.fetch_rows(&session, predicate, page).await?;
            let total_rows = self.count_rows(&session, predicate).await?;
            Ok::<_, Error>((rows, total_rows))
        }
        .await;

        let (rows, total_rows) = outcome.map_err(|e| {
            error!(
                table = %session.table_name(),
                predicate = %predicate.sql(),
                error = %e,
                "Trip query failed"
            );
            match e {
                Error::QueryFailed(_) => e,
                other => Error::QueryFailed(other.to_string()),
            }
        })?;

        debug!(
            page = page.page(),
            limit = page.limit(),
            returned = rows.len(),
            total_rows,
            "Trip query complete"
        );

        Ok(TripPage {
            rows,
            pagination: PaginationMeta::new(page, total_rows),
        })
    }

    async fn fetch_rows(
        &self,
        session: &StoreSession<'_>,
        predicate: &Predicate,
        page: PageRequest,
    ) -> Result<Vec<Value>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} ORDER BY pickup_datetime DESC",
            session.table_ref(),
            predicate.sql()
        );
        let (skip, fetch) = page.window();

        let batches = session
            .sql(&sql)
            .await?
            .with_param_values(predicate.param_values())?
            .limit(skip, Some(fetch))?
            .collect()
            .await?;

        batches_to_json(batches)
    }

    async fn count_rows(&self, session: &StoreSession<'_>, predicate: &Predicate) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) AS total_rows FROM {} WHERE {}",
            session.table_ref(),
            predicate.sql()
        );

        let batches = session
            .sql(&sql)
            .await?
            .with_param_values(predicate.param_values())?
            .collect()
            .await?;

        single_count(&batches)
    }
}
