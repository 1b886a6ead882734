use crate::expr::ExprKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
  /// A smart constructor was handed children that violate its arity.
  Construction { kind: ExprKind, msg: String },
  /// The interrupt token was raised while a traversal was running.
  Interrupted { during: &'static str },
}

pub type KResult<T> = Result<T, KernelError>;

impl std::fmt::Display for KernelError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      KernelError::Construction { kind, msg } => {
        write!(f, "malformed {kind} node: {msg}")
      },
      KernelError::Interrupted { during } => {
        write!(f, "interrupted during {during}")
      },
    }
  }
}

impl std::error::Error for KernelError {}
