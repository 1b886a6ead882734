use rustc_hash::FxHashSet;

use crate::{
  error::KResult,
  expr::{Expr, ExprData, ExprNode, LocalEntry},
  interrupt::Interrupt,
};

/// Hook applied to both sides of every compared pair before their kinds are
/// inspected.
pub trait Normalizer {
  fn normalize(&mut self, e: &Expr) -> Expr;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdNormalizer;

impl Normalizer for IdNormalizer {
  #[inline]
  fn normalize(&mut self, e: &Expr) -> Expr {
    e.clone()
  }
}

/// Adapts a closure into a `Normalizer`.
pub struct FnNormalizer<F>(pub F);

impl<F: FnMut(&Expr) -> Expr> Normalizer for FnNormalizer<F> {
  fn normalize(&mut self, e: &Expr) -> Expr {
    (self.0)(e)
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EqStats {
  /// Top-level `eq` calls.
  pub calls: u64,
  /// Pairs popped off the work stack.
  pub pairs_visited: u64,
  /// Shared pairs skipped because they were already compared.
  pub memo_hits: u64,
}

/// Structural equality up to renaming of bound variables.
///
/// Binder names, the cached type of constants, and anything else that is
/// not part of the structural hash are ignored. A pair of nodes that are
/// both referenced from several places is compared once per top-level call.
/// A repeated encounter is taken as equal, which is sound because terms are
/// acyclic and any mismatch below the first encounter fails the whole call.
pub struct ExprEq<N = IdNormalizer> {
  normalizer: N,
  use_hash: bool,
  interrupt: Interrupt,
  visited: FxHashSet<(*const ExprNode, *const ExprNode)>,
  // keeps memoized nodes alive so their addresses cannot be recycled
  pinned: Vec<Expr>,
  stats: EqStats,
}

impl ExprEq<IdNormalizer> {
  pub fn new() -> Self {
    ExprEq {
      normalizer: IdNormalizer,
      use_hash: true,
      interrupt: Interrupt::none(),
      visited: FxHashSet::default(),
      pinned: Vec::new(),
      stats: EqStats::default(),
    }
  }
}

impl Default for ExprEq<IdNormalizer> {
  fn default() -> Self {
    Self::new()
  }
}

impl<N: Normalizer> ExprEq<N> {
  /// Equal terms may hash differently once normalized, so the hash
  /// pre-check starts disabled; turn it back on with `use_hash(true)` when
  /// the normalizer preserves structural hashes.
  pub fn with_normalizer(normalizer: N) -> Self {
    ExprEq {
      normalizer,
      use_hash: false,
      interrupt: Interrupt::none(),
      visited: FxHashSet::default(),
      pinned: Vec::new(),
      stats: EqStats::default(),
    }
  }

  pub fn use_hash(mut self, on: bool) -> Self {
    self.use_hash = on;
    self
  }

  pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
    self.interrupt = interrupt;
    self
  }

  pub fn stats(&self) -> EqStats {
    self.stats
  }

  pub fn eq(&mut self, a: &Expr, b: &Expr) -> KResult<bool> {
    self.stats.calls += 1;
    if Expr::ptr_eq(a, b) {
      return Ok(true);
    }
    let result = self.compare(a, b);
    self.visited.clear();
    self.pinned.clear();
    result
  }

  fn compare(&mut self, a: &Expr, b: &Expr) -> KResult<bool> {
    fn push(todo: &mut Vec<(Expr, Expr, bool)>, a: &Expr, b: &Expr) {
      let shared = a.is_shared() && b.is_shared();
      todo.push((a.clone(), b.clone(), shared));
    }

    let mut todo: Vec<(Expr, Expr, bool)> = Vec::new();
    push(&mut todo, a, b);

    while let Some((a, b, shared)) = todo.pop() {
      self.interrupt.check("expression equality")?;
      self.stats.pairs_visited += 1;
      if Expr::ptr_eq(&a, &b) {
        continue;
      }
      if self.use_hash && a.get_hash() != b.get_hash() {
        return Ok(false);
      }
      let a = self.normalizer.normalize(&a);
      let b = self.normalizer.normalize(&b);
      if a.kind() != b.kind() {
        return Ok(false);
      }
      if let (ExprData::Var(i), ExprData::Var(j)) = (a.as_data(), b.as_data()) {
        if i != j {
          return Ok(false);
        }
        continue;
      }
      if shared {
        if !self.visited.insert((a.addr(), b.addr())) {
          self.stats.memo_hits += 1;
          continue;
        }
        self.pinned.push(a.clone());
        self.pinned.push(b.clone());
      }
      match (a.as_data(), b.as_data()) {
        (ExprData::Constant(n1, _), ExprData::Constant(n2, _)) => {
          if n1 != n2 {
            return Ok(false);
          }
        },
        (ExprData::Type(l1), ExprData::Type(l2)) => {
          if l1 != l2 {
            return Ok(false);
          }
        },
        (ExprData::Value(v1), ExprData::Value(v2)) => {
          if !v1.eq_value(v2.as_ref()) {
            return Ok(false);
          }
        },
        (ExprData::App(xs), ExprData::App(ys)) => {
          if xs.len() != ys.len() {
            return Ok(false);
          }
          for (x, y) in xs.iter().zip(ys).rev() {
            push(&mut todo, x, y);
          }
        },
        (ExprData::Lambda(_, d1, b1), ExprData::Lambda(_, d2, b2))
        | (ExprData::Pi(_, d1, b1), ExprData::Pi(_, d2, b2))
        | (ExprData::Sigma(_, d1, b1), ExprData::Sigma(_, d2, b2)) => {
          push(&mut todo, b1, b2);
          push(&mut todo, d1, d2);
        },
        (ExprData::Let(_, t1, v1, b1), ExprData::Let(_, t2, v2, b2)) => {
          push(&mut todo, b1, b2);
          push(&mut todo, v1, v2);
          match (t1, t2) {
            (Some(t1), Some(t2)) => push(&mut todo, t1, t2),
            (None, None) => {},
            _ => return Ok(false),
          }
        },
        (ExprData::Pair(a1, b1, t1), ExprData::Pair(a2, b2, t2)) => {
          push(&mut todo, t1, t2);
          push(&mut todo, b1, b2);
          push(&mut todo, a1, a2);
        },
        (ExprData::Proj(f1, a1), ExprData::Proj(f2, a2)) => {
          if f1 != f2 {
            return Ok(false);
          }
          push(&mut todo, a1, a2);
        },
        (ExprData::HEq(l1, r1), ExprData::HEq(l2, r2)) => {
          push(&mut todo, r1, r2);
          push(&mut todo, l1, l2);
        },
        (ExprData::MetaVar(n1, lctx1), ExprData::MetaVar(n2, lctx2)) => {
          if n1 != n2 || lctx1.len() != lctx2.len() {
            return Ok(false);
          }
          for (x, y) in lctx1.iter().zip(lctx2) {
            if x.s() != y.s() {
              return Ok(false);
            }
            match (x, y) {
              (
                LocalEntry::Lift { n: n1, .. },
                LocalEntry::Lift { n: n2, .. },
              ) => {
                if n1 != n2 {
                  return Ok(false);
                }
              },
              (LocalEntry::Inst { v: v1, .. }, LocalEntry::Inst { v: v2, .. }) => {
                push(&mut todo, v1, v2)
              },
              _ => return Ok(false),
            }
          }
        },
        _ => return Ok(false),
      }
    }
    Ok(true)
  }
}

/// Default-engine comparison. It never polls an interrupt; traversals that
/// must stay cancellable hold an `ExprEq` carrying their token.
impl PartialEq for Expr {
  fn eq(&self, other: &Expr) -> bool {
    matches!(ExprEq::new().eq(self, other), Ok(true))
  }
}

impl Eq for Expr {}
