use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrdenesError {
    #[error("order {0} not found")]
    OrderNotFound(u64),

    #[error("area {0} not found")]
    AreaNotFound(u64),

    #[error("area {area_id} is not assigned to order {order_id}")]
    AssignmentNotFound { order_id: u64, area_id: u64 },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("area already exists: {0}")]
    AreaExists(String),

    #[error("a timer tick is already running")]
    TickInProgress,

    #[error("storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OrdenesError>;
