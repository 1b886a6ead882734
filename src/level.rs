use std::{
  fmt,
  hash::{Hash, Hasher},
  sync::Arc,
};

use rustc_hash::FxHasher;

use crate::name::Name;

/// Universe levels, as carried by `Type(level)` nodes.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Level(Arc<LevelData>);

#[derive(Debug, PartialEq, Eq)]
pub enum LevelData {
  Zero,
  Succ(Level, u64),
  Max(Level, Level, u64),
  Param(Name, u64),
}

impl Level {
  pub fn as_data(&self) -> &LevelData {
    &self.0
  }

  pub fn get_hash(&self) -> u64 {
    match *self.0 {
      LevelData::Zero => 0,
      LevelData::Succ(_, h)
      | LevelData::Max(.., h)
      | LevelData::Param(_, h) => h,
    }
  }

  pub fn zero() -> Self {
    Level(Arc::new(LevelData::Zero))
  }

  pub fn succ(x: Level) -> Self {
    let hasher = &mut FxHasher::default();
    (1, x.get_hash()).hash(hasher);
    Level(Arc::new(LevelData::Succ(x, hasher.finish())))
  }

  pub fn max(x: Level, y: Level) -> Self {
    let hasher = &mut FxHasher::default();
    (2, x.get_hash(), y.get_hash()).hash(hasher);
    Level(Arc::new(LevelData::Max(x, y, hasher.finish())))
  }

  pub fn param(x: Name) -> Self {
    let hasher = &mut FxHasher::default();
    (3, x.get_hash()).hash(hasher);
    Level(Arc::new(LevelData::Param(x, hasher.finish())))
  }

  /// `succ^n(zero)`
  pub fn of_nat(n: u64) -> Self {
    (0..n).fold(Level::zero(), |l, _| Level::succ(l))
  }

  /// Splits `succ^k(base)` into `(base, k)`.
  pub fn to_offset(&self) -> (&Level, u64) {
    let mut l = self;
    let mut k = 0;
    while let LevelData::Succ(inner, _) = l.as_data() {
      l = inner;
      k += 1;
    }
    (l, k)
  }
}

impl Hash for Level {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.get_hash().hash(state);
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (base, k) = self.to_offset();
    match base.as_data() {
      LevelData::Zero => write!(f, "{k}"),
      LevelData::Param(n, _) if k == 0 => write!(f, "{n}"),
      LevelData::Param(n, _) => write!(f, "{n}+{k}"),
      LevelData::Max(a, b, _) if k == 0 => write!(f, "max({a}, {b})"),
      LevelData::Max(a, b, _) => write!(f, "max({a}, {b})+{k}"),
      LevelData::Succ(..) => unreachable!(),
    }
  }
}
