use crate::{
  error::KResult,
  expr::{Expr, ExprData, mk_var},
  free_vars::{has_free_var, lift_free_vars},
  interrupt::Interrupt,
  metavar::{MetavarEnv, add_inst},
  replace::replace,
};

/// Substitutes `substs` for the loose variables `s .. s + n` of `e`.
///
/// Variable `s + i` becomes `substs[n - 1 - i]`, so the last substitution
/// binds the innermost variable; variables above the window drop by `n`.
/// Substituted values may be open: they are lifted over every binder crossed
/// on the way to the occurrence. Metavariables receive one pending `Inst`
/// entry per value instead of being rewritten.
pub fn instantiate(
  e: &Expr,
  s: u64,
  substs: &[Expr],
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  instantiate_core::<false>(e, s, substs, menv, interrupt)
}

/// `instantiate(e, 0, substs, ..)` for closed `substs`, which are then
/// placed without lifting.
pub fn instantiate_with_closed(
  e: &Expr,
  substs: &[Expr],
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  debug_assert!(
    substs.iter().all(|v| {
      !matches!(has_free_var(v, 0, u64::MAX, menv, interrupt), Ok(true))
    }),
    "instantiate_with_closed given an open value"
  );
  instantiate_core::<true>(e, 0, substs, menv, interrupt)
}

fn instantiate_core<const CLOSED: bool>(
  e: &Expr,
  s: u64,
  substs: &[Expr],
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  let n = substs.len() as u64;
  if n == 0 || e.free_var_range() <= s {
    return Ok(e.clone());
  }
  let place = |v: &Expr, d: u64| {
    if CLOSED { Ok(v.clone()) } else { lift_free_vars(v, 0, d, interrupt) }
  };
  replace(e, interrupt, |m, offset| {
    let s1 = s + offset;
    if m.free_var_range() <= s1 {
      return Ok(Some(m.clone()));
    }
    match m.as_data() {
      ExprData::Var(vidx) => {
        let vidx = *vidx;
        if vidx < s1 + n {
          let v = &substs[(n - (vidx - s1) - 1) as usize];
          place(v, offset).map(Some)
        } else {
          Ok(Some(mk_var(vidx - n)))
        }
      },
      ExprData::MetaVar(..) => {
        // outermost variable first so the lower indices stay put
        let mut r = m.clone();
        for (i, v) in substs.iter().enumerate() {
          let i = i as u64;
          let v = place(v, offset + n - i - 1)?;
          r = add_inst(&r, s1 + n - i - 1, v, menv, interrupt)?;
        }
        Ok(Some(r))
      },
      _ => Ok(None),
    }
  })
}
