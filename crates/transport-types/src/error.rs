use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Invalid boundary condition: {name} must be finite and > 0, got {value}")]
    InvalidBoundaryCondition { name: &'static str, value: f64 },

    #[error("Inconsistent evolving set: {0}")]
    InconsistentEvolvingSet(String),

    #[error("Quasineutrality closure failed: {0}")]
    ClosureFailure(String),

    #[error("Solver diverged at iteration {iteration}: {message}")]
    SolverDiverged { iteration: usize, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FusionResult<T> = Result<T, FusionError>;
