use crate::error::{ApiError, Conflict};

pub struct QueryError {
    info: String,
    unique_violation: bool,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            unique_violation: false,
        }
    }

    /// A unique-pair collision is a client-visible outcome, not a server
    /// fault; callers pick which [`Conflict`] it maps to.
    pub fn into_conflict(self, conflict: Conflict) -> ApiError {
        if self.unique_violation {
            ApiError::Conflict(conflict)
        } else {
            ApiError::Query(self.info)
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        let unique_violation = value
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);

        let info = match value {
            sqlx::Error::RowNotFound => String::from("RowNotFound"),
            sqlx::Error::TypeNotFound { type_name } => format!("Type not found: {type_name}"),
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                format!("Column index out of bounds {index} ({len})")
            }
            sqlx::Error::ColumnDecode { index, source } => {
                format!("Column decode {index} ({source})")
            }
            sqlx::Error::PoolTimedOut => String::from("Pool timed out"),
            sqlx::Error::PoolClosed => String::from("Pool closed"),
            sqlx::Error::WorkerCrashed => String::from("Worker crashed"),
            other => format!("{other}"),
        };

        Self {
            info,
            unique_violation,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        ApiError::Query(value.info)
    }
}

pub struct CacheError {
    info: String,
}

impl CacheError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(value: CacheError) -> Self {
        ApiError::Cache(value.info)
    }
}
