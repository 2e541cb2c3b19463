//! Lead model.

use lapublica_core::lead::LeadData;
use lapublica_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `leads` table.
#[derive(Debug, Clone, FromRow)]
pub struct LeadRow {
    pub id: DbId,
    pub company_name: String,
    pub contact_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub estimated_revenue: Option<f64>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<LeadRow> for LeadData {
    fn from(row: LeadRow) -> Self {
        LeadData {
            id: row.id,
            company_name: row.company_name,
            contact_name: row.contact_name,
            email: row.email,
            phone: row.phone,
            estimated_revenue: row.estimated_revenue,
            priority: row.priority,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
