use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
  error::KResult,
  expr::{Expr, ExprData, ExprNode, LocalEntry, mk_var},
  interrupt::Interrupt,
  metavar::{MetavarEnv, add_lift},
  replace::replace,
};

/// Does `e` have a loose de Bruijn index? Metavariables count as open.
pub fn has_free_vars(e: &Expr) -> bool {
  e.free_var_range() > 0
}

/// One past the greatest loose index of `e`.
///
/// Without an environment this is the cached range, which treats every
/// metavariable as unbounded. With one, metavariables are bounded by
/// replaying their local context over the range of their assignment, or over
/// the context length they were declared with.
pub fn free_var_range(
  e: &Expr,
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<u64> {
  let Some(menv) = menv else {
    return Ok(e.free_var_range());
  };
  if !e.has_metavar() {
    return Ok(e.free_var_range());
  }

  enum Frame<'a> {
    Visit(&'a Expr),
    Combine(&'a Expr),
  }

  let mut memo: FxHashMap<*const ExprNode, u64> = FxHashMap::default();
  let mut work = vec![Frame::Visit(e)];
  let mut results: Vec<u64> = Vec::new();

  while let Some(frame) = work.pop() {
    match frame {
      Frame::Visit(e) => {
        interrupt.check("free variable range")?;
        if !e.has_metavar() {
          results.push(e.free_var_range());
          continue;
        }
        if let Some(r) = memo.get(&e.addr()) {
          results.push(*r);
          continue;
        }
        match e.as_data() {
          ExprData::MetaVar(..) => {
            let r = metavar_range(e, menv, interrupt)?;
            memo.insert(e.addr(), r);
            results.push(r);
          },
          ExprData::App(args) => {
            work.push(Frame::Combine(e));
            for a in args.iter().rev() {
              work.push(Frame::Visit(a));
            }
          },
          ExprData::Lambda(_, d, b)
          | ExprData::Pi(_, d, b)
          | ExprData::Sigma(_, d, b)
          | ExprData::HEq(d, b) => {
            work.push(Frame::Combine(e));
            work.push(Frame::Visit(b));
            work.push(Frame::Visit(d));
          },
          ExprData::Let(_, ty, v, b) => {
            work.push(Frame::Combine(e));
            work.push(Frame::Visit(b));
            work.push(Frame::Visit(v));
            if let Some(ty) = ty {
              work.push(Frame::Visit(ty));
            }
          },
          ExprData::Pair(a, b, t) => {
            work.push(Frame::Combine(e));
            work.push(Frame::Visit(t));
            work.push(Frame::Visit(b));
            work.push(Frame::Visit(a));
          },
          ExprData::Proj(_, a) => {
            work.push(Frame::Combine(e));
            work.push(Frame::Visit(a));
          },
          // no metavariable below these
          ExprData::Var(_)
          | ExprData::Constant(..)
          | ExprData::Type(_)
          | ExprData::Value(_) => results.push(e.free_var_range()),
        }
      },
      Frame::Combine(e) => {
        let r = match e.as_data() {
          ExprData::App(args) => {
            let rs = results.split_off(results.len() - args.len());
            rs.into_iter().max().unwrap_or(0)
          },
          ExprData::Lambda(..) | ExprData::Pi(..) | ExprData::Sigma(..) => {
            let b = results.pop().unwrap();
            let d = results.pop().unwrap();
            d.max(b.saturating_sub(1))
          },
          ExprData::HEq(..) => {
            let r = results.pop().unwrap();
            let l = results.pop().unwrap();
            l.max(r)
          },
          ExprData::Let(_, ty, ..) => {
            let b = results.pop().unwrap();
            let v = results.pop().unwrap();
            let t = ty.as_ref().map_or(0, |_| results.pop().unwrap());
            t.max(v).max(b.saturating_sub(1))
          },
          ExprData::Pair(..) => {
            let t = results.pop().unwrap();
            let b = results.pop().unwrap();
            let a = results.pop().unwrap();
            a.max(b).max(t)
          },
          _ => results.pop().unwrap(),
        };
        memo.insert(e.addr(), r);
        results.push(r);
      },
    }
  }
  Ok(results.pop().unwrap())
}

/// Range of a metavariable occurrence with its pending local context.
pub(crate) fn metavar_range(
  m: &Expr,
  menv: &MetavarEnv,
  interrupt: &Interrupt,
) -> KResult<u64> {
  let name = m.metavar_name();
  let mut r = match menv.get_assignment(name) {
    Some(v) => free_var_range(v, Some(menv), interrupt)?,
    None => match menv.context_len(name) {
      Some(len) => len,
      None => return Ok(u64::MAX),
    },
  };
  for entry in m.metavar_lctx() {
    r = match entry {
      LocalEntry::Lift { s, n } if r > *s => r.saturating_add(*n),
      LocalEntry::Inst { s, v } if r > *s => {
        (r - 1).max(free_var_range(v, Some(menv), interrupt)?)
      },
      _ => r,
    };
  }
  Ok(r)
}

/// Is there a loose index in `[low, high)`?
///
/// A metavariable whose range exceeds `low` answers yes, since its
/// assignment may mention any variable below its range.
pub fn has_free_var(
  e: &Expr,
  low: u64,
  high: u64,
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<bool> {
  if low >= high || e.free_var_range() <= low {
    return Ok(false);
  }
  let mut visited: FxHashSet<(*const ExprNode, u64)> = FxHashSet::default();
  let mut work: Vec<(&Expr, u64)> = vec![(e, 0)];
  while let Some((e, offset)) = work.pop() {
    interrupt.check("free variable query")?;
    let lo = low.saturating_add(offset);
    if e.free_var_range() <= lo {
      continue;
    }
    if e.is_shared() && !visited.insert((e.addr(), offset)) {
      continue;
    }
    match e.as_data() {
      ExprData::Var(i) => {
        if *i >= lo && *i < high.saturating_add(offset) {
          return Ok(true);
        }
      },
      ExprData::MetaVar(..) => {
        let r = match menv {
          Some(menv) => metavar_range(e, menv, interrupt)?,
          None => u64::MAX,
        };
        if r > lo {
          return Ok(true);
        }
      },
      ExprData::Constant(..) | ExprData::Type(_) | ExprData::Value(_) => {},
      ExprData::App(args) => {
        work.extend(args.iter().map(|a| (a, offset)));
      },
      ExprData::Lambda(_, d, b)
      | ExprData::Pi(_, d, b)
      | ExprData::Sigma(_, d, b) => {
        work.push((d, offset));
        work.push((b, offset + 1));
      },
      ExprData::Let(_, ty, v, b) => {
        if let Some(ty) = ty {
          work.push((ty, offset));
        }
        work.push((v, offset));
        work.push((b, offset + 1));
      },
      ExprData::Pair(a, b, t) => {
        work.push((a, offset));
        work.push((b, offset));
        work.push((t, offset));
      },
      ExprData::Proj(_, a) => work.push((a, offset)),
      ExprData::HEq(l, r) => {
        work.push((l, offset));
        work.push((r, offset));
      },
    }
  }
  Ok(false)
}

/// Adds `d` to every loose index `>= s`.
///
/// Metavariables cannot be rewritten yet, so they record a pending
/// `Lift { s + offset, d }` instead.
pub fn lift_free_vars(
  e: &Expr,
  s: u64,
  d: u64,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  if d == 0 || e.free_var_range() <= s {
    return Ok(e.clone());
  }
  replace(e, interrupt, |m, offset| {
    let s1 = s + offset;
    if m.free_var_range() <= s1 {
      return Ok(Some(m.clone()));
    }
    match m.as_data() {
      ExprData::Var(i) => Ok(Some(mk_var(i + d))),
      ExprData::MetaVar(..) => add_lift(m, s1, d, None, interrupt).map(Some),
      _ => Ok(None),
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    expr::{
      mk_app, mk_lambda, mk_metavar, mk_pi,
      tests::{ArbExpr, ArbPure, cnst},
    },
    name::Name,
  };

  fn lift(e: &Expr, s: u64, d: u64) -> Expr {
    lift_free_vars(e, s, d, &Interrupt::none()).unwrap()
  }

  fn has(e: &Expr, low: u64, high: u64, menv: Option<&MetavarEnv>) -> bool {
    has_free_var(e, low, high, menv, &Interrupt::none()).unwrap()
  }

  fn range(e: &Expr, menv: &MetavarEnv) -> u64 {
    free_var_range(e, Some(menv), &Interrupt::none()).unwrap()
  }

  #[quickcheck]
  fn prop_lift_shifts_range(x: ArbPure, d: u8) -> bool {
    let d = u64::from(d % 4);
    let r = x.0.free_var_range();
    let lifted = lift(&x.0, 0, d);
    lifted.free_var_range() == if r == 0 { 0 } else { r + d }
  }

  #[quickcheck]
  fn prop_lift_clears_window(x: ArbExpr) -> bool {
    let lifted = lift(&x.0, 1, 2);
    x.0.has_metavar() || !has(&lifted, 1, 3, None)
  }

  #[quickcheck]
  fn prop_closed_terms_are_untouched(x: ArbExpr) -> bool {
    has_free_vars(&x.0) || Expr::ptr_eq(&lift(&x.0, 0, 3), &x.0)
  }

  #[test]
  fn lift_respects_binders() {
    // fun x : #0, f #0 #1   lifted by 2 from 0  =  fun x : #2, f #0 #3
    let e = mk_lambda(
      Name::from("x"),
      mk_var(0),
      mk_app(vec![cnst("f"), mk_var(0), mk_var(1)]).unwrap(),
    );
    let l = lift(&e, 0, 2);
    assert_eq!(l.abst_domain().var_idx(), 2);
    assert_eq!(l.abst_body().arg(1).var_idx(), 0);
    assert_eq!(l.abst_body().arg(2).var_idx(), 3);
    assert!(Expr::ptr_eq(l.abst_body().arg(0), e.abst_body().arg(0)));
  }

  #[test]
  fn lift_records_pending_entry_on_metavars() {
    let m = mk_metavar(Name::from("m"));
    let e = mk_pi(Name::from("x"), cnst("A"), m);
    let l = lift(&e, 0, 2);
    let lctx = l.abst_body().metavar_lctx();
    assert_eq!(lctx.len(), 1);
    assert!(matches!(lctx[0], LocalEntry::Lift { s: 1, n: 2 }));
  }

  #[test]
  fn has_free_var_windows() {
    let e = mk_lambda(Name::from("x"), cnst("A"), mk_var(3));
    assert!(has(&e, 2, 3, None));
    assert!(!has(&e, 0, 2, None));
    assert!(!has(&e, 3, 10, None));
    assert!(has_free_vars(&e));
    assert!(!has_free_vars(&mk_lambda(Name::from("x"), cnst("A"), mk_var(0))));
  }

  #[test]
  fn metavar_ranges_follow_the_environment() {
    let mut menv = MetavarEnv::new();
    let m = menv.mk_metavar(1);
    assert!(has(&m, 0, 1, None));
    assert!(has(&m, 0, 1, Some(&menv)));
    assert!(!has(&m, 1, 5, Some(&menv)));
    let lifted = lift(&m, 0, 2);
    assert_eq!(range(&lifted, &menv), 3);
    menv.assign(m.metavar_name(), cnst("c"));
    assert_eq!(range(&lifted, &menv), 0);
  }

  #[test]
  fn queries_poll_the_interrupt() {
    let mut menv = MetavarEnv::new();
    let m = menv.mk_metavar(1);
    let e = mk_app(vec![cnst("f"), mk_var(0), m]).unwrap();
    let token = Interrupt::new();
    token.request();
    assert!(free_var_range(&e, Some(&menv), &token).is_err());
    assert!(has_free_var(&e, 1, 2, Some(&menv), &token).is_err());
    // metavariable-free terms answer from the cached range
    assert_eq!(free_var_range(&mk_var(4), Some(&menv), &token), Ok(5));
  }
}
