use std::{any::Any, fmt};

/// Opaque leaf payload of a `Value` node.
///
/// Builtin theories plug literals and operators into terms through this
/// trait. `eq_value` and `hash_value` must agree: values that compare equal
/// must hash equal, since the structural hash of a node covers its value.
pub trait Value: Any + Send + Sync + fmt::Debug + fmt::Display {
  /// Short tag used to separate hash domains of unrelated value families.
  fn kind(&self) -> &'static str;

  fn eq_value(&self, other: &dyn Value) -> bool;

  fn hash_value(&self) -> u64;

  fn as_any(&self) -> &dyn Any;
}
