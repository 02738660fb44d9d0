use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("invalid budget percentages: {0}")]
    InvalidConfiguration(String),

    #[error("invalid trip request: {0}")]
    InvalidRequest(String),

    #[error("no city found with id {0}")]
    UnknownCity(i64),

    #[error("destination city id could not be resolved for {destination:?}; send to_city_id or city_id")]
    UnresolvedDestination { destination: String },

    #[error("missing required identifier: {0}")]
    MissingRequiredIdentifier(&'static str),
}

impl PlanError {
    /// True for errors that only abort the submission step.
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedDestination { .. } | Self::MissingRequiredIdentifier(_)
        )
    }
}
