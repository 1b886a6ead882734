use crate::{
  error::KResult,
  expr::{Expr, mk_app_args},
  expr_eq::ExprEq,
  instantiate::instantiate,
  interrupt::Interrupt,
  metavar::MetavarEnv,
  replace::replace,
};

/// An application whose function is a lambda.
pub fn is_head_beta(t: &Expr) -> bool {
  t.is_app() && t.arg(0).is_lambda()
}

/// Applies `f` to `args`, contracting as many leading lambdas of `f` as
/// there are arguments in one instantiation. Leftover arguments are applied
/// to the result; a non-lambda `f` is simply applied.
pub fn apply_beta(
  f: &Expr,
  args: &[Expr],
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  if args.is_empty() {
    return Ok(f.clone());
  }
  if !f.is_lambda() {
    return Ok(mk_app_args(f.clone(), args));
  }
  let mut m = 1;
  let mut body = f.abst_body();
  while body.is_lambda() && m < args.len() {
    body = body.abst_body();
    m += 1;
  }
  let r = instantiate(body, 0, &args[..m], menv, interrupt)?;
  Ok(mk_app_args(r, &args[m..]))
}

/// One reduction step at the root; any other term is returned as is.
pub fn head_beta_reduce(
  t: &Expr,
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  if !is_head_beta(t) {
    return Ok(t.clone());
  }
  let args = t.args();
  apply_beta(&args[0], &args[1..], menv, interrupt)
}

/// Contracts every beta redex, outermost first, until nothing changes.
///
/// Terms without a normal form make this loop forever; bound the work with
/// the interrupt token.
pub fn beta_reduce(
  t: &Expr,
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  let mut eq = ExprEq::new().with_interrupt(interrupt.clone());
  let mut t = t.clone();
  let mut passes = 0u64;
  loop {
    passes += 1;
    let new_t = replace(&t, interrupt, |m, _| {
      if is_head_beta(m) {
        head_beta_reduce(m, menv, interrupt).map(Some)
      } else {
        Ok(None)
      }
    })?;
    if Expr::ptr_eq(&new_t, &t) || eq.eq(&new_t, &t)? {
      tracing::trace!(passes, "beta fixpoint reached");
      return Ok(new_t);
    }
    t = new_t;
  }
}
