use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    #[error("cart-pole stepped before reset")]
    NotReset,
    #[error("invalid action {0}: expected 0 (left) or 1 (right)")]
    InvalidAction(usize),
}
