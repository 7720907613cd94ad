use ml::MlError;
use physics::PhysicsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("simulator used before reset")]
    NotReset,
    #[error("environment already closed")]
    Closed,
    #[error("invalid action {action}: the simulator accepts 0..{count}")]
    InvalidAction { action: usize, count: usize },
    #[error("a {width}x{height} render leaves an empty crop")]
    EmptyFrame { width: u32, height: u32 },
    #[error("frame conversion failed: {0}")]
    Tensor(#[from] MlError),
}

impl From<PhysicsError> for EnvError {
    fn from(err: PhysicsError) -> Self {
        match err {
            PhysicsError::NotReset => EnvError::NotReset,
            PhysicsError::InvalidAction(action) => EnvError::InvalidAction { action, count: 2 },
        }
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("environment failure: {0}")]
    Env(#[from] EnvError),
    #[error("policy failure: {0}")]
    Policy(#[from] MlError),
}
