//! Depth-30 diamonds unfold to 2^30 leaves; every engine must stay linear in
//! the number of distinct nodes. Work is measured with the engines' own
//! counters rather than wall-clock time.

mod common;

use common::{cnst, diamond, int, int_type};
use kernel_expr::{
  Expr, ExprEq, Interrupt, MaxSharing, Name, beta_reduce,
  expr::{mk_app2, mk_heq, mk_lambda, mk_var},
  instantiate, lift_free_vars,
};

const DEPTH: usize = 30;

fn none() -> Interrupt {
  Interrupt::none()
}

#[test]
fn equality_visits_each_pair_once() {
  let a = diamond(DEPTH, mk_var(0));
  let b = diamond(DEPTH, mk_var(0));
  let mut eq = ExprEq::new();
  assert!(eq.eq(&a, &b).unwrap());
  let stats = eq.stats();
  assert!(stats.pairs_visited < 10 * DEPTH as u64, "{stats:?}");
  assert!(stats.memo_hits >= DEPTH as u64 - 1, "{stats:?}");

  let c = diamond(DEPTH, mk_var(1));
  assert!(!eq.eq(&a, &c).unwrap());
}

#[test]
fn identity_short_circuits() {
  let a = diamond(DEPTH, mk_var(0));
  let mut eq = ExprEq::new();
  assert!(eq.eq(&a, &a.clone()).unwrap());
  assert_eq!(eq.stats().pairs_visited, 0);
}

#[test]
fn differences_deep_in_the_dag_are_found() {
  // equal hashes are not enough: without the hash pre-check the walk still
  // has to reach the leaves
  let a = diamond(DEPTH, mk_var(0));
  let b = diamond(DEPTH, mk_var(1));
  let mut eq = ExprEq::new().use_hash(false);
  assert!(!eq.eq(&a, &b).unwrap());
  assert!(eq.stats().pairs_visited < 10 * DEPTH as u64);
}

#[test]
fn canonicalize_collapses_two_diamonds() {
  let a = diamond(DEPTH, int(1));
  let b = diamond(DEPTH, int(1));
  let mut sharing = MaxSharing::new();
  let r = sharing.canonicalize(&mk_heq(a, b)).unwrap();
  assert!(Expr::ptr_eq(r.heq_lhs(), r.heq_rhs()));

  let stats = sharing.stats();
  assert!(stats.nodes_visited < 10 * DEPTH as u64, "{stats:?}");
  // f, 1, one application per level, the heq
  assert_eq!(sharing.len(), DEPTH + 3);
}

#[test]
fn substitution_preserves_sharing() {
  let d = diamond(DEPTH, mk_var(0));
  let r = instantiate(&d, 0, &[int(42)], None, &none()).unwrap();
  assert!(Expr::ptr_eq(r.arg(1), r.arg(2)));
  assert_eq!(r, diamond(DEPTH, int(42)));

  let lifted = lift_free_vars(&d, 0, 3, &none()).unwrap();
  assert!(Expr::ptr_eq(lifted.arg(1), lifted.arg(2)));
  assert_eq!(lifted, diamond(DEPTH, mk_var(3)));
}

#[test]
fn beta_reduces_a_shared_redex_once() {
  let id = mk_lambda(Name::from("x"), int_type(), mk_var(0));
  let d = diamond(DEPTH, mk_app2(id, cnst("c")));
  let r = beta_reduce(&d, None, &none()).unwrap();
  assert!(Expr::ptr_eq(r.arg(1), r.arg(2)));
  assert_eq!(r, diamond(DEPTH, cnst("c")));
}
