mod common;

use common::{cnst, init_tracing, int, int_type};
use kernel_expr::{
  Expr, ExprEq, Interrupt, KernelError, Level, MaxSharing, MetavarEnv, Name,
  apply_beta, beta_reduce, canonicalize,
  expr::{
    mk_app, mk_app2, mk_lambda, mk_pair, mk_pi, mk_proj, mk_sigma, mk_type,
    mk_var,
  },
  instantiate, instantiate_with_closed, lift_free_vars,
};

fn none() -> Interrupt {
  Interrupt::none()
}

#[test]
fn identity_applied_to_a_literal() {
  init_tracing();
  let id = mk_lambda(Name::from("x"), int_type(), mk_var(0));
  let e = mk_app2(id, int(5));
  let r = beta_reduce(&e, None, &none()).unwrap();
  assert_eq!(r, int(5));
  assert!(r.is_value());
}

#[test]
fn pi_binder_names_do_not_matter() {
  let ty = || mk_type(Level::zero());
  let a = mk_pi(Name::from("a"), ty(), mk_var(0));
  let b = mk_pi(Name::from("b"), ty(), mk_var(0));
  let c = mk_pi(Name::from("a"), ty(), ty());
  let mut eq = ExprEq::new();
  assert!(eq.eq(&a, &b).unwrap());
  assert!(!eq.eq(&a, &c).unwrap());
}

#[test]
fn substitution_agrees_with_beta() {
  // t = fun x : Int, (x, plus x 1) : Sigma y : Int, Int
  let body = mk_pair(
    mk_var(0),
    mk_app(vec![cnst("plus"), mk_var(0), int(1)]).unwrap(),
    mk_sigma(Name::from("y"), int_type(), int_type()),
  );
  let t = mk_lambda(Name::from("x"), int_type(), body.clone());
  let v = mk_proj(true, cnst("p"));
  let by_subst = instantiate(&body, 0, &[v.clone()], None, &none()).unwrap();
  let by_closed = instantiate_with_closed(&body, &[v.clone()], None, &none()).unwrap();
  let by_beta = apply_beta(&t, &[v], None, &none()).unwrap();
  assert_eq!(by_subst, by_beta);
  assert_eq!(by_closed, by_beta);
  assert_eq!(by_beta.to_string(), "(pair (proj1 p) (plus (proj1 p) 1) : (Sigma y : Int, Int))");
}

#[test]
fn lift_then_instantiate_round_trips() {
  let t = mk_lambda(
    Name::from("x"),
    mk_var(2),
    mk_app(vec![cnst("g"), mk_var(0), mk_var(1), mk_var(4)]).unwrap(),
  );
  let lifted = lift_free_vars(&t, 0, 1, &none()).unwrap();
  assert_ne!(lifted, t);
  let back = instantiate(&lifted, 0, &[cnst("anything")], None, &none()).unwrap();
  assert_eq!(back, t);
}

#[test]
fn beta_normal_forms_keep_their_handle() {
  let t = mk_pi(
    Name::from("x"),
    int_type(),
    mk_lambda(Name::from("y"), mk_var(0), mk_app2(mk_var(1), mk_var(0))),
  );
  let r = beta_reduce(&t, None, &none()).unwrap();
  assert!(Expr::ptr_eq(&r, &t));
}

#[test]
fn independently_built_children_collapse() {
  let child = || mk_app(vec![cnst("plus"), int(2), int(3)]).unwrap();
  let parent = mk_app(vec![cnst("pair"), child(), child()]).unwrap();
  let mut sharing = MaxSharing::new();
  let r = sharing.canonicalize(&parent).unwrap();
  assert!(Expr::ptr_eq(r.arg(1), r.arg(2)));
  let again = sharing.canonicalize(&r).unwrap();
  assert!(Expr::ptr_eq(&again, &r));
  assert!(Expr::ptr_eq(&canonicalize(&r, &none()).unwrap(), &r));
}

#[test]
fn metavariables_defer_substitution_until_assigned() {
  // (fun x : Int, ?M.0) 7  ~>  ?M.0[inst:0 7]  ~>  plus 7 7  once ?M.0 := plus #0 #0
  let mut menv = MetavarEnv::new();
  let m = menv.mk_metavar(1);
  let e = mk_app2(mk_lambda(Name::from("x"), int_type(), m.clone()), int(7));
  let reduced = beta_reduce(&e, Some(&menv), &none()).unwrap();
  assert!(reduced.is_metavar());
  assert_eq!(reduced.metavar_lctx().len(), 1);

  menv.assign(
    m.metavar_name(),
    mk_app(vec![cnst("plus"), mk_var(0), mk_var(0)]).unwrap(),
  );
  let r = menv.instantiate_metavars(&reduced, &none()).unwrap();
  assert_eq!(r, mk_app(vec![cnst("plus"), int(7), int(7)]).unwrap());
}

#[test]
fn construction_errors_are_reported() {
  let err = mk_app(vec![cnst("f")]).unwrap_err();
  assert!(matches!(err, KernelError::Construction { .. }));
  assert_eq!(
    err.to_string(),
    "malformed app node: expected a function and at least one argument, got 1 children"
  );
}

#[test]
fn cancellation_from_another_thread() {
  // (fun x, x x x) (fun x, x x x) never reaches a fixpoint
  let w = mk_lambda(
    Name::from("x"),
    int_type(),
    mk_app(vec![mk_var(0), mk_var(0), mk_var(0)]).unwrap(),
  );
  let e = mk_app2(w.clone(), w);
  let token = Interrupt::new();
  let remote = token.clone();
  let requester = std::thread::spawn(move || {
    std::thread::sleep(std::time::Duration::from_millis(20));
    remote.request();
  });
  let r = beta_reduce(&e, None, &token);
  requester.join().unwrap();
  assert!(matches!(r, Err(KernelError::Interrupted { .. })), "{r:?}");
}

#[test]
fn terms_cross_threads() {
  fn assert_send_sync<T: Send + Sync>() {}
  assert_send_sync::<Expr>();

  let t = mk_app(vec![cnst("plus"), int(2), int(3)]).unwrap();
  let handles: Vec<_> = (0..2)
    .map(|_| {
      let t = t.clone();
      std::thread::spawn(move || canonicalize(&t, &Interrupt::none()).unwrap())
    })
    .collect();
  for h in handles {
    assert_eq!(h.join().unwrap(), t);
  }
}
