use rustc_hash::FxHashMap;

use crate::{
  error::KResult,
  expr::{Expr, ExprData, LocalEntry, mk_metavar, mk_metavar_with_context},
  free_vars::{lift_free_vars, metavar_range},
  instantiate::instantiate,
  interrupt::Interrupt,
  name::Name,
  replace::replace,
};

/// Records a pending `lift_free_vars(_, s, n)` on metavariable `m`.
///
/// A trailing `Lift { s', n' }` with `s' <= s <= s' + n'` absorbs the new
/// lift. With an environment, a lift that cannot affect `m` is dropped.
pub fn add_lift(
  m: &Expr,
  s: u64,
  n: u64,
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  if n == 0 {
    return Ok(m.clone());
  }
  if let Some(menv) = menv {
    if metavar_range(m, menv, interrupt)? <= s {
      return Ok(m.clone());
    }
  }
  let mut lctx = m.metavar_lctx().to_vec();
  match lctx.last_mut() {
    Some(LocalEntry::Lift { s: s1, n: n1 }) if *s1 <= s && s <= *s1 + *n1 => {
      *n1 += n;
    },
    _ => lctx.push(LocalEntry::Lift { s, n }),
  }
  Ok(mk_metavar_with_context(m.metavar_name().clone(), lctx))
}

/// Records a pending instantiation of variable `s` with `v` on `m`.
///
/// When the most recent entry is `Lift { s', n }` with `s' <= s < s' + n`,
/// variable `s` was introduced by that lift and cannot occur, so the lift
/// shrinks by one and `v` is discarded.
pub fn add_inst(
  m: &Expr,
  s: u64,
  v: Expr,
  menv: Option<&MetavarEnv>,
  interrupt: &Interrupt,
) -> KResult<Expr> {
  if let Some(menv) = menv {
    if metavar_range(m, menv, interrupt)? <= s {
      return Ok(m.clone());
    }
  }
  let mut lctx = m.metavar_lctx().to_vec();
  match lctx.last_mut() {
    Some(LocalEntry::Lift { s: s1, n: n1 }) if *s1 <= s && s < *s1 + *n1 => {
      if *n1 == 1 {
        lctx.pop();
      } else {
        *n1 -= 1;
      }
    },
    _ => lctx.push(LocalEntry::Inst { s, v }),
  }
  Ok(mk_metavar_with_context(m.metavar_name().clone(), lctx))
}

#[derive(Debug, Clone)]
struct MetavarDecl {
  /// Number of binders in scope where the metavariable was created, or
  /// `None` when only an assignment is known.
  context_len: Option<u64>,
  assignment: Option<Expr>,
}

/// Assignment store for metavariables.
///
/// This is the small piece of the unifier that the kernel itself consumes:
/// fresh names, assignments, and expansion of assigned metavariables.
/// Assignments must be acyclic.
#[derive(Debug, Clone, Default)]
pub struct MetavarEnv {
  decls: FxHashMap<Name, MetavarDecl>,
  next_idx: u64,
}

impl MetavarEnv {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fresh metavariable `?M.i` created under `context_len` binders.
  pub fn mk_metavar(&mut self, context_len: u64) -> Expr {
    let name = Name::num(Name::str(Name::anon(), "M"), self.next_idx);
    self.next_idx += 1;
    self.decls.insert(
      name.clone(),
      MetavarDecl { context_len: Some(context_len), assignment: None },
    );
    mk_metavar(name)
  }

  pub fn context_len(&self, name: &Name) -> Option<u64> {
    self.decls.get(name).and_then(|d| d.context_len)
  }

  /// Assigns `v` to `name`. Assigning twice is a caller bug.
  pub fn assign(&mut self, name: &Name, v: Expr) {
    let decl = self
      .decls
      .entry(name.clone())
      .or_insert(MetavarDecl { context_len: None, assignment: None });
    assert!(decl.assignment.is_none(), "metavariable {name} assigned twice");
    tracing::trace!(%name, value = %v, "assign metavariable");
    decl.assignment = Some(v);
  }

  pub fn is_assigned(&self, name: &Name) -> bool {
    self.get_assignment(name).is_some()
  }

  pub fn get_assignment(&self, name: &Name) -> Option<&Expr> {
    self.decls.get(name).and_then(|d| d.assignment.as_ref())
  }

  pub fn len(&self) -> usize {
    self.decls.len()
  }

  pub fn is_empty(&self) -> bool {
    self.decls.is_empty()
  }

  pub fn clear(&mut self) {
    self.decls.clear();
    self.next_idx = 0;
  }

  /// Replays a local context over `v`, oldest entry first.
  pub fn apply_local_context(
    &self,
    v: &Expr,
    lctx: &[LocalEntry],
    interrupt: &Interrupt,
  ) -> KResult<Expr> {
    let mut r = v.clone();
    for entry in lctx {
      r = match entry {
        LocalEntry::Lift { s, n } => lift_free_vars(&r, *s, *n, interrupt)?,
        LocalEntry::Inst { s, v } => {
          let v = self.instantiate_metavars(v, interrupt)?;
          instantiate(&r, *s, &[v], Some(self), interrupt)?
        },
      };
    }
    Ok(r)
  }

  /// Replaces every assigned metavariable in `e` by its (recursively
  /// expanded) assignment with the occurrence's local context applied.
  pub fn instantiate_metavars(
    &self,
    e: &Expr,
    interrupt: &Interrupt,
  ) -> KResult<Expr> {
    if !e.has_metavar() {
      return Ok(e.clone());
    }
    replace(e, interrupt, |m, _| {
      if !m.has_metavar() {
        return Ok(Some(m.clone()));
      }
      match m.as_data() {
        ExprData::MetaVar(name, lctx) => match self.get_assignment(name) {
          Some(v) => {
            let v = self.instantiate_metavars(v, interrupt)?;
            self.apply_local_context(&v, lctx, interrupt).map(Some)
          },
          None => Ok(None),
        },
        _ => Ok(None),
      }
    })
  }
}
