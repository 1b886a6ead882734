use rustc_hash::FxHashMap;

use crate::{
  error::KResult,
  expr::{
    Expr, ExprData, ExprNode, LocalEntry, update_abst, update_app,
    update_heq, update_let, update_metavar, update_pair, update_proj,
  },
  interrupt::Interrupt,
};

/// Top-down rewrite of `e`.
///
/// `f(node, offset)` is consulted before descending into `node`, where
/// `offset` counts the binders crossed on the way down. `Some(r)` replaces
/// the node by `r` without visiting `r`; `None` rebuilds the node from its
/// rewritten children. Constants are leaves (their cached type is closed and
/// left alone); metavariables expose the values of their `Inst` entries as
/// children.
///
/// Subterms reachable through more than one handle are rewritten once per
/// offset. Unchanged subtrees keep their identity, so `replace` returns `e`
/// itself when `f` never fires.
pub fn replace<F>(e: &Expr, interrupt: &Interrupt, mut f: F) -> KResult<Expr>
where
  F: FnMut(&Expr, u64) -> KResult<Option<Expr>>,
{
  enum Frame<'a> {
    Visit(&'a Expr, u64),
    Build(&'a Expr, u64),
  }

  let mut cache: FxHashMap<(*const ExprNode, u64), Expr> = FxHashMap::default();
  let mut work: Vec<Frame<'_>> = vec![Frame::Visit(e, 0)];
  let mut results: Vec<Expr> = Vec::new();

  while let Some(frame) = work.pop() {
    match frame {
      Frame::Visit(e, offset) => {
        interrupt.check("replace")?;
        let shared = e.is_shared();
        if shared {
          if let Some(r) = cache.get(&(e.addr(), offset)) {
            results.push(r.clone());
            continue;
          }
        }
        if let Some(r) = f(e, offset)? {
          if shared {
            cache.insert((e.addr(), offset), r.clone());
          }
          results.push(r);
          continue;
        }
        match e.as_data() {
          ExprData::Var(_)
          | ExprData::Constant(..)
          | ExprData::Type(_)
          | ExprData::Value(_) => results.push(e.clone()),
          ExprData::App(args) => {
            work.push(Frame::Build(e, offset));
            for a in args.iter().rev() {
              work.push(Frame::Visit(a, offset));
            }
          },
          ExprData::Lambda(_, d, b)
          | ExprData::Pi(_, d, b)
          | ExprData::Sigma(_, d, b) => {
            work.push(Frame::Build(e, offset));
            work.push(Frame::Visit(b, offset + 1));
            work.push(Frame::Visit(d, offset));
          },
          ExprData::Let(_, ty, v, b) => {
            work.push(Frame::Build(e, offset));
            work.push(Frame::Visit(b, offset + 1));
            work.push(Frame::Visit(v, offset));
            if let Some(ty) = ty {
              work.push(Frame::Visit(ty, offset));
            }
          },
          ExprData::Pair(a, b, t) => {
            work.push(Frame::Build(e, offset));
            work.push(Frame::Visit(t, offset));
            work.push(Frame::Visit(b, offset));
            work.push(Frame::Visit(a, offset));
          },
          ExprData::Proj(_, a) => {
            work.push(Frame::Build(e, offset));
            work.push(Frame::Visit(a, offset));
          },
          ExprData::HEq(l, r) => {
            work.push(Frame::Build(e, offset));
            work.push(Frame::Visit(r, offset));
            work.push(Frame::Visit(l, offset));
          },
          ExprData::MetaVar(_, lctx) => {
            if lctx.iter().all(LocalEntry::is_lift) {
              results.push(e.clone());
              continue;
            }
            work.push(Frame::Build(e, offset));
            for entry in lctx.iter().rev() {
              if let LocalEntry::Inst { v, .. } = entry {
                work.push(Frame::Visit(v, offset));
              }
            }
          },
        }
      },
      Frame::Build(e, offset) => {
        let r = rebuild(e, &mut results);
        if e.is_shared() {
          cache.insert((e.addr(), offset), r.clone());
        }
        results.push(r);
      },
    }
  }
  Ok(results.pop().unwrap())
}

/// Pops the rewritten children of `e` off `results` (they were pushed in
/// child order) and rebuilds `e` from them.
pub(crate) fn rebuild(e: &Expr, results: &mut Vec<Expr>) -> Expr {
  match e.as_data() {
    ExprData::App(args) => {
      let new_args = results.split_off(results.len() - args.len());
      update_app(e, new_args)
    },
    ExprData::Lambda(..) | ExprData::Pi(..) | ExprData::Sigma(..) => {
      let b = results.pop().unwrap();
      let d = results.pop().unwrap();
      update_abst(e, d, b)
    },
    ExprData::Let(_, ty, ..) => {
      let b = results.pop().unwrap();
      let v = results.pop().unwrap();
      let t = ty.as_ref().map(|_| results.pop().unwrap());
      update_let(e, t, v, b)
    },
    ExprData::Pair(..) => {
      let t = results.pop().unwrap();
      let b = results.pop().unwrap();
      let a = results.pop().unwrap();
      update_pair(e, a, b, t)
    },
    ExprData::Proj(..) => {
      let a = results.pop().unwrap();
      update_proj(e, a)
    },
    ExprData::HEq(..) => {
      let r = results.pop().unwrap();
      let l = results.pop().unwrap();
      update_heq(e, l, r)
    },
    ExprData::MetaVar(_, lctx) => {
      let insts = lctx.iter().filter(|entry| !entry.is_lift()).count();
      let mut vals = results.split_off(results.len() - insts).into_iter();
      let new_lctx = lctx
        .iter()
        .map(|entry| match entry {
          LocalEntry::Lift { s, n } => LocalEntry::Lift { s: *s, n: *n },
          LocalEntry::Inst { s, .. } => {
            LocalEntry::Inst { s: *s, v: vals.next().unwrap() }
          },
        })
        .collect();
      update_metavar(e, new_lctx)
    },
    ExprData::Constant(_, ty) => {
      let t = ty.as_ref().map(|_| results.pop().unwrap());
      crate::expr::update_const(e, t)
    },
    ExprData::Var(_) | ExprData::Type(_) | ExprData::Value(_) => e.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    expr::{
      mk_app, mk_app2, mk_lambda, mk_var,
      tests::{ArbExpr, cnst},
    },
    name::Name,
  };

  #[quickcheck]
  fn prop_identity_rewrite_keeps_handle(x: ArbExpr) -> bool {
    let r = replace(&x.0, &Interrupt::none(), |_, _| Ok(None)).unwrap();
    Expr::ptr_eq(&r, &x.0)
  }

  #[test]
  fn offsets_count_binders() {
    // fun x, f #0 #1  ~>  each var records the offset it was seen at
    let body = mk_app(vec![cnst("f"), mk_var(0), mk_var(1)]).unwrap();
    let e = mk_lambda(Name::from("x"), mk_var(0), body);
    let r = replace(&e, &Interrupt::none(), |m, offset| match m.as_data() {
      ExprData::Var(i) => Ok(Some(mk_var(i * 10 + offset))),
      _ => Ok(None),
    })
    .unwrap();
    assert_eq!(r.abst_domain().var_idx(), 0);
    assert_eq!(r.abst_body().arg(1).var_idx(), 1);
    assert_eq!(r.abst_body().arg(2).var_idx(), 11);
  }

  #[test]
  fn shared_subterms_are_rewritten_once() {
    let shared = mk_app2(cnst("g"), mk_var(0));
    let e = mk_app(vec![cnst("f"), shared.clone(), shared.clone()]).unwrap();
    let mut calls = 0;
    let r = replace(&e, &Interrupt::none(), |m, _| {
      calls += 1;
      Ok(m.is_var().then(|| cnst("c")))
    })
    .unwrap();
    // e, f, shared (once), g, #0
    assert_eq!(calls, 5);
    assert!(Expr::ptr_eq(r.arg(1), r.arg(2)));
  }

  #[test]
  fn interrupt_aborts() {
    let token = Interrupt::new();
    token.request();
    let e = mk_app2(cnst("f"), mk_var(0));
    assert!(replace(&e, &token, |_, _| Ok(None)).is_err());
  }
}
