use thiserror::Error;

/// Error types for the recurring bill engine
#[derive(Error, Debug)]
pub enum BillError {
    /// The bill or occurrence does not exist for the given tenant
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// The operation is not allowed in the current state (e.g. already paid)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Input rejected before touching the database
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Error from the aggregate cache collaborator
    #[error("Cache error: {0}")]
    Cache(String),
}

impl BillError {
    pub fn bill_not_found(id: i32) -> Self {
        BillError::NotFound {
            entity: "Recurring bill",
            id,
        }
    }

    pub fn occurrence_not_found(id: i32) -> Self {
        BillError::NotFound {
            entity: "Occurrence",
            id,
        }
    }

    pub fn account_not_found(id: i32) -> Self {
        BillError::NotFound {
            entity: "Bank account",
            id,
        }
    }

    /// True for failures of a collaborator (database or cache) rather than of the request.
    pub fn is_upstream(&self) -> bool {
        matches!(self, BillError::Database(_) | BillError::Cache(_))
    }
}

/// Type alias for Result with BillError
pub type Result<T> = std::result::Result<T, BillError>;
