#![allow(dead_code)]

use std::{any::Any, fmt, sync::Arc};

use kernel_expr::{
  Expr, Name, Value,
  expr::{mk_app, mk_constant, mk_value},
};

/// The builtin type of integers.
#[derive(Debug, PartialEq, Eq)]
pub struct IntType;

/// An integer literal.
#[derive(Debug, PartialEq, Eq)]
pub struct IntLiteral(pub i64);

impl fmt::Display for IntType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Int")
  }
}

impl fmt::Display for IntLiteral {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl Value for IntType {
  fn kind(&self) -> &'static str {
    "int_type"
  }
  fn eq_value(&self, other: &dyn Value) -> bool {
    other.as_any().is::<IntType>()
  }
  fn hash_value(&self) -> u64 {
    0
  }
  fn as_any(&self) -> &dyn Any {
    self
  }
}

impl Value for IntLiteral {
  fn kind(&self) -> &'static str {
    "int"
  }
  fn eq_value(&self, other: &dyn Value) -> bool {
    other.as_any().downcast_ref::<IntLiteral>() == Some(self)
  }
  fn hash_value(&self) -> u64 {
    self.0 as u64
  }
  fn as_any(&self) -> &dyn Any {
    self
  }
}

pub fn int_type() -> Expr {
  mk_value(Arc::new(IntType))
}

pub fn int(n: i64) -> Expr {
  mk_value(Arc::new(IntLiteral(n)))
}

pub fn cnst(s: &str) -> Expr {
  mk_constant(Name::from(s))
}

/// `f e e` nested `depth` times over `leaf`: a DAG of `depth + 1` distinct
/// applications whose unfolded tree has `2^depth` leaves. Each level gets its
/// own `f` node.
pub fn diamond(depth: usize, leaf: Expr) -> Expr {
  (0..depth).fold(leaf, |e, _| mk_app(vec![cnst("f"), e.clone(), e]).unwrap())
}

pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}
