//! Repository for the `leads` table. Read-only.

use lapublica_core::types::DbId;
use sqlx::PgPool;

use crate::models::lead::LeadRow;

/// Column list for leads queries.
const COLUMNS: &str = "id, company_name, contact_name, email, phone, estimated_revenue, \
                       priority, status, created_at, updated_at";

pub struct LeadRepo;

impl LeadRepo {
    /// Find a lead by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LeadRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leads WHERE id = $1");
        sqlx::query_as::<_, LeadRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
