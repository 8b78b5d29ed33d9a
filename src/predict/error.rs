use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("object {norad_id}: instant not representable relative to epoch: {message}")]
    Epoch { norad_id: u32, message: String },
    #[error("object {norad_id}: {message}")]
    Model { norad_id: u32, message: String },
    #[error("object {norad_id}: propagation produced a non-finite position")]
    NonFinite { norad_id: u32 },
}

#[derive(Debug, Error)]
pub enum PassError {
    #[error("object {0} is not in the catalog")]
    UnknownObject(u32),
    #[error("search horizon must be positive and at most {max} hours, got {hours}")]
    InvalidHorizon { hours: f64, max: f64 },
    #[error("search steps must be positive")]
    InvalidStep,
    #[error("propagation failed: {0}")]
    Propagation(#[from] PropagationError),
    #[error("pass search exceeded its budget of {limit} evaluations")]
    BudgetExhausted { limit: usize },
}
