use std::{
  fmt,
  hash::{Hash, Hasher},
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use rustc_hash::FxHasher;

use crate::{
  error::{KResult, KernelError},
  level::Level,
  name::Name,
  value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
  Var,
  Constant,
  Type,
  Value,
  App,
  Lambda,
  Pi,
  Sigma,
  Let,
  Pair,
  Proj,
  HEq,
  MetaVar,
}

impl fmt::Display for ExprKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ExprKind::Var => "var",
      ExprKind::Constant => "constant",
      ExprKind::Type => "type",
      ExprKind::Value => "value",
      ExprKind::App => "app",
      ExprKind::Lambda => "lambda",
      ExprKind::Pi => "pi",
      ExprKind::Sigma => "sigma",
      ExprKind::Let => "let",
      ExprKind::Pair => "pair",
      ExprKind::Proj => "proj",
      ExprKind::HEq => "heq",
      ExprKind::MetaVar => "metavar",
    };
    write!(f, "{s}")
  }
}

/// Pending operation recorded on a metavariable.
///
/// `Lift { s, n }` lifts the loose variables `>= s` of the eventual
/// assignment by `n`; `Inst { s, v }` instantiates variable `s` with `v`.
#[derive(Debug, Clone)]
pub enum LocalEntry {
  Lift { s: u64, n: u64 },
  Inst { s: u64, v: Expr },
}

impl LocalEntry {
  pub fn s(&self) -> u64 {
    match self {
      LocalEntry::Lift { s, .. } | LocalEntry::Inst { s, .. } => *s,
    }
  }

  pub fn is_lift(&self) -> bool {
    matches!(self, LocalEntry::Lift { .. })
  }
}

/// Oldest entry first; new entries are appended at the end.
pub type LocalContext = Vec<LocalEntry>;

#[derive(Debug)]
pub enum ExprData {
  Var(u64),
  /// Name plus the optional cached type; the type never takes part in
  /// equality or hashing.
  Constant(Name, Option<Expr>),
  Type(Level),
  Value(Arc<dyn Value>),
  /// Function first, at least one argument, function never an `App`.
  App(Vec<Expr>),
  Lambda(Name, Expr, Expr),
  Pi(Name, Expr, Expr),
  Sigma(Name, Expr, Expr),
  Let(Name, Option<Expr>, Expr, Expr),
  /// First component, second component, pair type.
  Pair(Expr, Expr, Expr),
  /// `true` projects the first component.
  Proj(bool, Expr),
  HEq(Expr, Expr),
  MetaVar(Name, LocalContext),
}

#[derive(Debug)]
pub struct ExprNode {
  data: ExprData,
  hash: u64,
  free_var_range: u64,
  has_metavar: bool,
  max_shared: AtomicBool,
}

/// Shared handle to an immutable term node.
///
/// Cloning is a reference count bump; structurally equal terms may or may not
/// share a node. `Expr::ptr_eq` is the O(1) identity test, `==` is
/// alpha-aware structural equality (see `expr_eq`).
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

impl Expr {
  fn new(data: ExprData) -> Self {
    let hash = node_hash(&data);
    let free_var_range = node_free_var_range(&data);
    let has_metavar = node_has_metavar(&data);
    Expr(Arc::new(ExprNode {
      data,
      hash,
      free_var_range,
      has_metavar,
      max_shared: AtomicBool::new(false),
    }))
  }

  pub fn as_data(&self) -> &ExprData {
    &self.0.data
  }

  pub fn get_hash(&self) -> u64 {
    self.0.hash
  }

  /// One past the greatest loose de Bruijn index, `u64::MAX` when the term
  /// contains a metavariable.
  pub fn free_var_range(&self) -> u64 {
    self.0.free_var_range
  }

  pub fn has_metavar(&self) -> bool {
    self.0.has_metavar
  }

  pub fn ptr_eq(a: &Expr, b: &Expr) -> bool {
    Arc::ptr_eq(&a.0, &b.0)
  }

  pub fn addr(&self) -> *const ExprNode {
    Arc::as_ptr(&self.0)
  }

  /// More than one handle points at this node.
  pub fn is_shared(&self) -> bool {
    Arc::strong_count(&self.0) > 1
  }

  pub fn is_max_shared(&self) -> bool {
    self.0.max_shared.load(Ordering::Relaxed)
  }

  pub(crate) fn mark_max_shared(&self) {
    self.0.max_shared.store(true, Ordering::Relaxed);
  }

  pub fn kind(&self) -> ExprKind {
    match self.as_data() {
      ExprData::Var(_) => ExprKind::Var,
      ExprData::Constant(..) => ExprKind::Constant,
      ExprData::Type(_) => ExprKind::Type,
      ExprData::Value(_) => ExprKind::Value,
      ExprData::App(_) => ExprKind::App,
      ExprData::Lambda(..) => ExprKind::Lambda,
      ExprData::Pi(..) => ExprKind::Pi,
      ExprData::Sigma(..) => ExprKind::Sigma,
      ExprData::Let(..) => ExprKind::Let,
      ExprData::Pair(..) => ExprKind::Pair,
      ExprData::Proj(..) => ExprKind::Proj,
      ExprData::HEq(..) => ExprKind::HEq,
      ExprData::MetaVar(..) => ExprKind::MetaVar,
    }
  }

  pub fn is_var(&self) -> bool {
    matches!(self.as_data(), ExprData::Var(_))
  }
  pub fn is_constant(&self) -> bool {
    matches!(self.as_data(), ExprData::Constant(..))
  }
  pub fn is_type(&self) -> bool {
    matches!(self.as_data(), ExprData::Type(_))
  }
  pub fn is_value(&self) -> bool {
    matches!(self.as_data(), ExprData::Value(_))
  }
  pub fn is_app(&self) -> bool {
    matches!(self.as_data(), ExprData::App(_))
  }
  pub fn is_lambda(&self) -> bool {
    matches!(self.as_data(), ExprData::Lambda(..))
  }
  pub fn is_pi(&self) -> bool {
    matches!(self.as_data(), ExprData::Pi(..))
  }
  pub fn is_sigma(&self) -> bool {
    matches!(self.as_data(), ExprData::Sigma(..))
  }
  pub fn is_abstraction(&self) -> bool {
    matches!(
      self.as_data(),
      ExprData::Lambda(..) | ExprData::Pi(..) | ExprData::Sigma(..)
    )
  }
  pub fn is_let(&self) -> bool {
    matches!(self.as_data(), ExprData::Let(..))
  }
  pub fn is_pair(&self) -> bool {
    matches!(self.as_data(), ExprData::Pair(..))
  }
  pub fn is_proj(&self) -> bool {
    matches!(self.as_data(), ExprData::Proj(..))
  }
  pub fn is_heq(&self) -> bool {
    matches!(self.as_data(), ExprData::HEq(..))
  }
  pub fn is_metavar(&self) -> bool {
    matches!(self.as_data(), ExprData::MetaVar(..))
  }

  #[cold]
  fn wrong_kind(&self, accessor: &str) -> ! {
    panic!("{accessor} called on a {} node", self.kind())
  }

  pub fn var_idx(&self) -> u64 {
    match self.as_data() {
      ExprData::Var(i) => *i,
      _ => self.wrong_kind("var_idx"),
    }
  }

  pub fn const_name(&self) -> &Name {
    match self.as_data() {
      ExprData::Constant(n, _) => n,
      _ => self.wrong_kind("const_name"),
    }
  }

  pub fn const_type(&self) -> Option<&Expr> {
    match self.as_data() {
      ExprData::Constant(_, ty) => ty.as_ref(),
      _ => self.wrong_kind("const_type"),
    }
  }

  pub fn ty_level(&self) -> &Level {
    match self.as_data() {
      ExprData::Type(l) => l,
      _ => self.wrong_kind("ty_level"),
    }
  }

  pub fn to_value(&self) -> &dyn Value {
    match self.as_data() {
      ExprData::Value(v) => v.as_ref(),
      _ => self.wrong_kind("to_value"),
    }
  }

  /// Function followed by the arguments.
  pub fn args(&self) -> &[Expr] {
    match self.as_data() {
      ExprData::App(args) => args,
      _ => self.wrong_kind("args"),
    }
  }

  pub fn arg(&self, i: usize) -> &Expr {
    &self.args()[i]
  }

  pub fn num_args(&self) -> usize {
    self.args().len()
  }

  fn abst_parts(&self, accessor: &str) -> (&Name, &Expr, &Expr) {
    match self.as_data() {
      ExprData::Lambda(n, d, b)
      | ExprData::Pi(n, d, b)
      | ExprData::Sigma(n, d, b) => (n, d, b),
      _ => self.wrong_kind(accessor),
    }
  }

  pub fn abst_name(&self) -> &Name {
    self.abst_parts("abst_name").0
  }
  pub fn abst_domain(&self) -> &Expr {
    self.abst_parts("abst_domain").1
  }
  pub fn abst_body(&self) -> &Expr {
    self.abst_parts("abst_body").2
  }

  fn let_parts(&self, accessor: &str) -> (&Name, Option<&Expr>, &Expr, &Expr) {
    match self.as_data() {
      ExprData::Let(n, ty, v, b) => (n, ty.as_ref(), v, b),
      _ => self.wrong_kind(accessor),
    }
  }

  pub fn let_name(&self) -> &Name {
    self.let_parts("let_name").0
  }
  pub fn let_type(&self) -> Option<&Expr> {
    self.let_parts("let_type").1
  }
  pub fn let_value(&self) -> &Expr {
    self.let_parts("let_value").2
  }
  pub fn let_body(&self) -> &Expr {
    self.let_parts("let_body").3
  }

  fn pair_parts(&self, accessor: &str) -> (&Expr, &Expr, &Expr) {
    match self.as_data() {
      ExprData::Pair(a, b, t) => (a, b, t),
      _ => self.wrong_kind(accessor),
    }
  }

  pub fn pair_first(&self) -> &Expr {
    self.pair_parts("pair_first").0
  }
  pub fn pair_second(&self) -> &Expr {
    self.pair_parts("pair_second").1
  }
  pub fn pair_type(&self) -> &Expr {
    self.pair_parts("pair_type").2
  }

  pub fn proj_first(&self) -> bool {
    match self.as_data() {
      ExprData::Proj(first, _) => *first,
      _ => self.wrong_kind("proj_first"),
    }
  }

  pub fn proj_arg(&self) -> &Expr {
    match self.as_data() {
      ExprData::Proj(_, a) => a,
      _ => self.wrong_kind("proj_arg"),
    }
  }

  pub fn heq_lhs(&self) -> &Expr {
    match self.as_data() {
      ExprData::HEq(l, _) => l,
      _ => self.wrong_kind("heq_lhs"),
    }
  }

  pub fn heq_rhs(&self) -> &Expr {
    match self.as_data() {
      ExprData::HEq(_, r) => r,
      _ => self.wrong_kind("heq_rhs"),
    }
  }

  pub fn metavar_name(&self) -> &Name {
    match self.as_data() {
      ExprData::MetaVar(n, _) => n,
      _ => self.wrong_kind("metavar_name"),
    }
  }

  pub fn metavar_lctx(&self) -> &[LocalEntry] {
    match self.as_data() {
      ExprData::MetaVar(_, lctx) => lctx,
      _ => self.wrong_kind("metavar_lctx"),
    }
  }
}

fn node_hash(data: &ExprData) -> u64 {
  let hasher = &mut FxHasher::default();
  match data {
    ExprData::Var(i) => (0u8, i).hash(hasher),
    ExprData::Constant(n, _) => (1u8, n.get_hash()).hash(hasher),
    ExprData::Type(l) => (2u8, l.get_hash()).hash(hasher),
    ExprData::Value(v) => (3u8, v.kind(), v.hash_value()).hash(hasher),
    ExprData::App(args) => {
      4u8.hash(hasher);
      for a in args {
        a.get_hash().hash(hasher);
      }
    },
    ExprData::Lambda(_, d, b) => (5u8, d.get_hash(), b.get_hash()).hash(hasher),
    ExprData::Pi(_, d, b) => (6u8, d.get_hash(), b.get_hash()).hash(hasher),
    ExprData::Sigma(_, d, b) => (7u8, d.get_hash(), b.get_hash()).hash(hasher),
    ExprData::Let(_, ty, v, b) => {
      (8u8, ty.as_ref().map(Expr::get_hash), v.get_hash(), b.get_hash())
        .hash(hasher)
    },
    ExprData::Pair(a, b, t) => {
      (9u8, a.get_hash(), b.get_hash(), t.get_hash()).hash(hasher)
    },
    ExprData::Proj(first, a) => (10u8, first, a.get_hash()).hash(hasher),
    ExprData::HEq(l, r) => (11u8, l.get_hash(), r.get_hash()).hash(hasher),
    ExprData::MetaVar(n, lctx) => {
      (12u8, n.get_hash()).hash(hasher);
      for entry in lctx {
        match entry {
          LocalEntry::Lift { s, n } => (0u8, s, n).hash(hasher),
          LocalEntry::Inst { s, v } => (1u8, s, v.get_hash()).hash(hasher),
        }
      }
    },
  }
  hasher.finish()
}

fn node_free_var_range(data: &ExprData) -> u64 {
  let under_binder = |b: &Expr| b.free_var_range().saturating_sub(1);
  match data {
    ExprData::Var(i) => i.saturating_add(1),
    ExprData::Constant(..) | ExprData::Type(_) | ExprData::Value(_) => 0,
    ExprData::App(args) => {
      args.iter().map(Expr::free_var_range).max().unwrap_or(0)
    },
    ExprData::Lambda(_, d, b)
    | ExprData::Pi(_, d, b)
    | ExprData::Sigma(_, d, b) => d.free_var_range().max(under_binder(b)),
    ExprData::Let(_, ty, v, b) => ty
      .as_ref()
      .map_or(0, Expr::free_var_range)
      .max(v.free_var_range())
      .max(under_binder(b)),
    ExprData::Pair(a, b, t) => {
      a.free_var_range().max(b.free_var_range()).max(t.free_var_range())
    },
    ExprData::Proj(_, a) => a.free_var_range(),
    ExprData::HEq(l, r) => l.free_var_range().max(r.free_var_range()),
    ExprData::MetaVar(..) => u64::MAX,
  }
}

fn node_has_metavar(data: &ExprData) -> bool {
  match data {
    ExprData::Var(_)
    | ExprData::Constant(..)
    | ExprData::Type(_)
    | ExprData::Value(_) => false,
    ExprData::App(args) => args.iter().any(Expr::has_metavar),
    ExprData::Lambda(_, d, b)
    | ExprData::Pi(_, d, b)
    | ExprData::Sigma(_, d, b)
    | ExprData::HEq(d, b) => d.has_metavar() || b.has_metavar(),
    ExprData::Let(_, ty, v, b) => {
      ty.as_ref().is_some_and(Expr::has_metavar)
        || v.has_metavar()
        || b.has_metavar()
    },
    ExprData::Pair(a, b, t) => {
      a.has_metavar() || b.has_metavar() || t.has_metavar()
    },
    ExprData::Proj(_, a) => a.has_metavar(),
    ExprData::MetaVar(..) => true,
  }
}

impl Hash for Expr {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.get_hash().hash(state);
  }
}

pub fn mk_var(idx: u64) -> Expr {
  Expr::new(ExprData::Var(idx))
}

pub fn mk_constant(name: Name) -> Expr {
  Expr::new(ExprData::Constant(name, None))
}

pub fn mk_constant_with_type(name: Name, ty: Expr) -> Expr {
  Expr::new(ExprData::Constant(name, Some(ty)))
}

pub fn mk_type(level: Level) -> Expr {
  Expr::new(ExprData::Type(level))
}

pub fn mk_value(v: Arc<dyn Value>) -> Expr {
  Expr::new(ExprData::Value(v))
}

/// Builds an application from the function followed by its arguments.
///
/// An application in function position is flattened, so
/// `mk_app([f a, b])` is `f a b`.
pub fn mk_app(args: Vec<Expr>) -> KResult<Expr> {
  if args.len() < 2 {
    return Err(KernelError::Construction {
      kind: ExprKind::App,
      msg: format!(
        "expected a function and at least one argument, got {} children",
        args.len()
      ),
    });
  }
  Ok(mk_app_core(args))
}

pub fn mk_app2(f: Expr, a: Expr) -> Expr {
  mk_app_core(vec![f, a])
}

/// `f` applied to `args`, or `f` itself when there are none.
pub fn mk_app_args(f: Expr, args: &[Expr]) -> Expr {
  if args.is_empty() {
    return f;
  }
  let mut children = Vec::with_capacity(args.len() + 1);
  children.push(f);
  children.extend_from_slice(args);
  mk_app_core(children)
}

fn mk_app_core(mut args: Vec<Expr>) -> Expr {
  debug_assert!(args.len() >= 2);
  let head = args[0].clone();
  if let ExprData::App(inner) = head.as_data() {
    let mut flat = Vec::with_capacity(inner.len() + args.len() - 1);
    flat.extend_from_slice(inner);
    flat.extend(args.drain(1..));
    return Expr::new(ExprData::App(flat));
  }
  Expr::new(ExprData::App(args))
}

pub fn mk_lambda(name: Name, domain: Expr, body: Expr) -> Expr {
  Expr::new(ExprData::Lambda(name, domain, body))
}

pub fn mk_pi(name: Name, domain: Expr, body: Expr) -> Expr {
  Expr::new(ExprData::Pi(name, domain, body))
}

pub fn mk_sigma(name: Name, domain: Expr, body: Expr) -> Expr {
  Expr::new(ExprData::Sigma(name, domain, body))
}

pub fn mk_let(name: Name, ty: Option<Expr>, value: Expr, body: Expr) -> Expr {
  Expr::new(ExprData::Let(name, ty, value, body))
}

pub fn mk_pair(first: Expr, second: Expr, ty: Expr) -> Expr {
  Expr::new(ExprData::Pair(first, second, ty))
}

pub fn mk_proj(first: bool, arg: Expr) -> Expr {
  Expr::new(ExprData::Proj(first, arg))
}

pub fn mk_heq(lhs: Expr, rhs: Expr) -> Expr {
  Expr::new(ExprData::HEq(lhs, rhs))
}

pub fn mk_metavar(name: Name) -> Expr {
  Expr::new(ExprData::MetaVar(name, Vec::new()))
}

pub fn mk_metavar_with_context(name: Name, lctx: LocalContext) -> Expr {
  Expr::new(ExprData::MetaVar(name, lctx))
}

fn same_opt(a: Option<&Expr>, b: Option<&Expr>) -> bool {
  match (a, b) {
    (Some(a), Some(b)) => Expr::ptr_eq(a, b),
    (None, None) => true,
    _ => false,
  }
}

/// Rebuilds an application from new children, returning `e` itself when
/// every child is pointer-identical.
pub fn update_app(e: &Expr, new_args: Vec<Expr>) -> Expr {
  let args = e.args();
  assert_eq!(args.len(), new_args.len(), "update_app changes the arity");
  if args.iter().zip(&new_args).all(|(a, b)| Expr::ptr_eq(a, b)) {
    return e.clone();
  }
  mk_app_core(new_args)
}

/// Rebuilds a `Lambda`, `Pi` or `Sigma`, keeping its kind and binder name.
pub fn update_abst(e: &Expr, new_domain: Expr, new_body: Expr) -> Expr {
  let (name, domain, body) = e.abst_parts("update_abst");
  if Expr::ptr_eq(domain, &new_domain) && Expr::ptr_eq(body, &new_body) {
    return e.clone();
  }
  let name = name.clone();
  match e.as_data() {
    ExprData::Lambda(..) => mk_lambda(name, new_domain, new_body),
    ExprData::Pi(..) => mk_pi(name, new_domain, new_body),
    _ => mk_sigma(name, new_domain, new_body),
  }
}

pub fn update_let(
  e: &Expr,
  new_ty: Option<Expr>,
  new_value: Expr,
  new_body: Expr,
) -> Expr {
  let (name, ty, value, body) = e.let_parts("update_let");
  if same_opt(ty, new_ty.as_ref())
    && Expr::ptr_eq(value, &new_value)
    && Expr::ptr_eq(body, &new_body)
  {
    return e.clone();
  }
  mk_let(name.clone(), new_ty, new_value, new_body)
}

pub fn update_pair(
  e: &Expr,
  new_first: Expr,
  new_second: Expr,
  new_ty: Expr,
) -> Expr {
  let (first, second, ty) = e.pair_parts("update_pair");
  if Expr::ptr_eq(first, &new_first)
    && Expr::ptr_eq(second, &new_second)
    && Expr::ptr_eq(ty, &new_ty)
  {
    return e.clone();
  }
  mk_pair(new_first, new_second, new_ty)
}

pub fn update_proj(e: &Expr, new_arg: Expr) -> Expr {
  if Expr::ptr_eq(e.proj_arg(), &new_arg) {
    return e.clone();
  }
  mk_proj(e.proj_first(), new_arg)
}

pub fn update_heq(e: &Expr, new_lhs: Expr, new_rhs: Expr) -> Expr {
  if Expr::ptr_eq(e.heq_lhs(), &new_lhs) && Expr::ptr_eq(e.heq_rhs(), &new_rhs)
  {
    return e.clone();
  }
  mk_heq(new_lhs, new_rhs)
}

pub fn update_const(e: &Expr, new_ty: Option<Expr>) -> Expr {
  if same_opt(e.const_type(), new_ty.as_ref()) {
    return e.clone();
  }
  Expr::new(ExprData::Constant(e.const_name().clone(), new_ty))
}

pub fn update_metavar(e: &Expr, new_lctx: LocalContext) -> Expr {
  let lctx = e.metavar_lctx();
  let unchanged = lctx.len() == new_lctx.len()
    && lctx.iter().zip(&new_lctx).all(|pair| match pair {
      (
        LocalEntry::Lift { s: s1, n: n1 },
        LocalEntry::Lift { s: s2, n: n2 },
      ) => s1 == s2 && n1 == n2,
      (LocalEntry::Inst { s: s1, v: v1 }, LocalEntry::Inst { s: s2, v: v2 }) => {
        s1 == s2 && Expr::ptr_eq(v1, v2)
      },
      _ => false,
    });
  if unchanged {
    return e.clone();
  }
  mk_metavar_with_context(e.metavar_name().clone(), new_lctx)
}

impl fmt::Display for LocalEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LocalEntry::Lift { s, n } => write!(f, "lift:{s} {n}"),
      LocalEntry::Inst { s, v } => write!(f, "inst:{s} {v}"),
    }
  }
}

/// Compact rendering for logs and panics; binder names are printed but
/// variables stay as `#i`. Walks the term as a tree.
impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.as_data() {
      ExprData::Var(i) => write!(f, "#{i}"),
      ExprData::Constant(n, _) => write!(f, "{n}"),
      ExprData::Type(l) => match l.as_data() {
        crate::level::LevelData::Zero => write!(f, "Type"),
        _ => write!(f, "(Type {l})"),
      },
      ExprData::Value(v) => write!(f, "{v}"),
      ExprData::App(args) => {
        write!(f, "(")?;
        for (i, a) in args.iter().enumerate() {
          if i > 0 {
            write!(f, " ")?;
          }
          write!(f, "{a}")?;
        }
        write!(f, ")")
      },
      ExprData::Lambda(n, d, b) => write!(f, "(fun {n} : {d}, {b})"),
      ExprData::Pi(n, d, b) => write!(f, "(Pi {n} : {d}, {b})"),
      ExprData::Sigma(n, d, b) => write!(f, "(Sigma {n} : {d}, {b})"),
      ExprData::Let(n, Some(ty), v, b) => {
        write!(f, "(let {n} : {ty} := {v} in {b})")
      },
      ExprData::Let(n, None, v, b) => write!(f, "(let {n} := {v} in {b})"),
      ExprData::Pair(a, b, t) => write!(f, "(pair {a} {b} : {t})"),
      ExprData::Proj(true, a) => write!(f, "(proj1 {a})"),
      ExprData::Proj(false, a) => write!(f, "(proj2 {a})"),
      ExprData::HEq(l, r) => write!(f, "({l} == {r})"),
      ExprData::MetaVar(n, lctx) if lctx.is_empty() => write!(f, "?{n}"),
      ExprData::MetaVar(n, lctx) => {
        write!(f, "?{n}[")?;
        for (i, entry) in lctx.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{entry}")?;
        }
        write!(f, "]")
      },
    }
  }
}

impl fmt::Debug for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Expr({self})")
  }
}
