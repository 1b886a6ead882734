use rustc_hash::FxHashMap;

use crate::{
  error::KResult,
  expr::{Expr, ExprData, ExprNode, LocalEntry},
  expr_eq::ExprEq,
  interrupt::Interrupt,
  replace::rebuild,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SharingStats {
  /// Nodes popped off the work stack.
  pub nodes_visited: u64,
  /// Nodes answered by the structural cache.
  pub cache_hits: u64,
  /// Nodes answered by the per-call identity memo.
  pub memo_hits: u64,
}

/// Hash-consing pass: after `canonicalize`, structurally equal subterms of
/// everything canonicalized through the same instance are the same node.
///
/// Canonical nodes carry the max-shared bit, so a canonical term handed to
/// any instance is recognised at its root without a traversal.
#[derive(Default)]
pub struct MaxSharing {
  // canonical nodes bucketed by structural hash
  cache: FxHashMap<u64, Vec<Expr>>,
  len: usize,
  memo: FxHashMap<*const ExprNode, Expr>,
  eq: ExprEq,
  interrupt: Interrupt,
  stats: SharingStats,
}

impl MaxSharing {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
    self.eq = ExprEq::new().with_interrupt(interrupt.clone());
    self.interrupt = interrupt;
    self
  }

  pub fn stats(&self) -> SharingStats {
    self.stats
  }

  /// Number of canonical nodes held by the cache.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Forgets every canonical node. Max-shared bits stay set; such nodes are
  /// re-entered into the cache when met again.
  pub fn clear(&mut self) {
    tracing::debug!(evicted = self.len, "sharing cache cleared");
    self.cache.clear();
    self.len = 0;
  }

  /// Canonical node structurally equal to `e`, if any.
  fn lookup(&mut self, e: &Expr) -> KResult<Option<Expr>> {
    if let Some(bucket) = self.cache.get(&e.get_hash()) {
      for c in bucket {
        if self.eq.eq(c, e)? {
          return Ok(Some(c.clone()));
        }
      }
    }
    Ok(None)
  }

  fn insert(&mut self, e: Expr) {
    self.cache.entry(e.get_hash()).or_default().push(e);
    self.len += 1;
  }

  fn intern(&mut self, e: Expr) -> KResult<Expr> {
    if let Some(existing) = self.lookup(&e)? {
      self.stats.cache_hits += 1;
      return Ok(existing);
    }
    e.mark_max_shared();
    self.insert(e.clone());
    Ok(e)
  }

  pub fn canonicalize(&mut self, e: &Expr) -> KResult<Expr> {
    let result = self.canonicalize_core(e);
    self.memo.clear();
    result
  }

  fn canonicalize_core(&mut self, e: &Expr) -> KResult<Expr> {
    enum Frame<'a> {
      Visit(&'a Expr),
      Build(&'a Expr),
    }

    let mut work = vec![Frame::Visit(e)];
    let mut results: Vec<Expr> = Vec::new();

    while let Some(frame) = work.pop() {
      match frame {
        Frame::Visit(e) => {
          self.interrupt.check("max sharing")?;
          self.stats.nodes_visited += 1;
          if let Some(r) = self.memo.get(&e.addr()) {
            self.stats.memo_hits += 1;
            results.push(r.clone());
            continue;
          }
          if let Some(r) = self.lookup(e)? {
            self.stats.cache_hits += 1;
            self.memo.insert(e.addr(), r.clone());
            results.push(r);
            continue;
          }
          if e.is_max_shared() {
            self.insert(e.clone());
            self.memo.insert(e.addr(), e.clone());
            results.push(e.clone());
            continue;
          }
          match e.as_data() {
            ExprData::Var(_)
            | ExprData::Type(_)
            | ExprData::Value(_)
            | ExprData::Constant(_, None) => {
              // the lookup above already missed
              e.mark_max_shared();
              self.insert(e.clone());
              self.memo.insert(e.addr(), e.clone());
              results.push(e.clone());
            },
            ExprData::Constant(_, Some(ty)) => {
              work.push(Frame::Build(e));
              work.push(Frame::Visit(ty));
            },
            ExprData::App(args) => {
              work.push(Frame::Build(e));
              for a in args.iter().rev() {
                work.push(Frame::Visit(a));
              }
            },
            ExprData::Lambda(_, d, b)
            | ExprData::Pi(_, d, b)
            | ExprData::Sigma(_, d, b)
            | ExprData::HEq(d, b) => {
              work.push(Frame::Build(e));
              work.push(Frame::Visit(b));
              work.push(Frame::Visit(d));
            },
            ExprData::Let(_, ty, v, b) => {
              work.push(Frame::Build(e));
              work.push(Frame::Visit(b));
              work.push(Frame::Visit(v));
              if let Some(ty) = ty {
                work.push(Frame::Visit(ty));
              }
            },
            ExprData::Pair(a, b, t) => {
              work.push(Frame::Build(e));
              work.push(Frame::Visit(t));
              work.push(Frame::Visit(b));
              work.push(Frame::Visit(a));
            },
            ExprData::Proj(_, a) => {
              work.push(Frame::Build(e));
              work.push(Frame::Visit(a));
            },
            ExprData::MetaVar(_, lctx) => {
              work.push(Frame::Build(e));
              for entry in lctx.iter().rev() {
                if let LocalEntry::Inst { v, .. } = entry {
                  work.push(Frame::Visit(v));
                }
              }
            },
          }
        },
        Frame::Build(e) => {
          let rebuilt = rebuild(e, &mut results);
          let r = self.intern(rebuilt)?;
          self.memo.insert(e.addr(), r.clone());
          results.push(r);
        },
      }
    }
    Ok(results.pop().unwrap())
  }
}

/// Canonicalizes `e` with a throwaway cache. Subterms of `e` end up shared
/// with each other, not with earlier results.
pub fn canonicalize(e: &Expr, interrupt: &Interrupt) -> KResult<Expr> {
  if e.is_max_shared() {
    return Ok(e.clone());
  }
  MaxSharing::new().with_interrupt(interrupt.clone()).canonicalize(e)
}
