//! Expression kernel for a dependently typed proof checker.
//!
//! Terms (`expr`) are immutable, reference counted DAG nodes using de Bruijn
//! indices. On top of them sit the engines every client of the kernel leans
//! on: structural equality up to alpha renaming (`expr_eq`), lifting and
//! substitution (`free_vars`, `instantiate`), beta reduction (`beta`), and
//! hash-consing (`max_sharing`). Metavariables carry their pending
//! substitutions in a local context (`metavar`).
//!
//! Every traversal is iterative, memoizes shared subterms by node address,
//! and polls an `Interrupt` token.

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod beta;
pub mod error;
pub mod expr;
pub mod expr_eq;
pub mod free_vars;
pub mod instantiate;
pub mod interrupt;
pub mod level;
pub mod max_sharing;
pub mod metavar;
pub mod name;
pub mod replace;
pub mod value;

pub use beta::{apply_beta, beta_reduce, head_beta_reduce, is_head_beta};
pub use error::{KResult, KernelError};
pub use expr::{Expr, ExprData, ExprKind, LocalContext, LocalEntry};
pub use expr_eq::{ExprEq, FnNormalizer, IdNormalizer, Normalizer};
pub use free_vars::{free_var_range, has_free_var, has_free_vars, lift_free_vars};
pub use instantiate::{instantiate, instantiate_with_closed};
pub use interrupt::Interrupt;
pub use level::Level;
pub use max_sharing::{MaxSharing, canonicalize};
pub use metavar::{MetavarEnv, add_inst, add_lift};
pub use name::Name;
pub use replace::replace;
pub use value::Value;
