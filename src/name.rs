use std::{
  fmt,
  hash::{Hash, Hasher},
  sync::Arc,
};

use rustc_hash::FxHasher;

/// Hierarchical names: `a.b.3` is `num(str(str(anon, "a"), "b"), 3)`.
#[derive(PartialEq, Eq, Debug, PartialOrd, Ord, Clone)]
pub struct Name(Arc<NameData>);

#[derive(PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum NameData {
  Anonymous,
  Str(Name, String, u64),
  Num(Name, u64, u64),
}

impl Name {
  pub fn as_data(&self) -> &NameData {
    &self.0
  }

  pub fn get_hash(&self) -> u64 {
    match *self.0 {
      NameData::Anonymous => 0,
      NameData::Str(.., h) | NameData::Num(.., h) => h,
    }
  }

  pub fn anon() -> Self {
    Name(Arc::new(NameData::Anonymous))
  }

  pub fn str(pre: Name, s: impl Into<String>) -> Self {
    let s = s.into();
    let hasher = &mut FxHasher::default();
    (7, pre.get_hash(), &s).hash(hasher);
    Name(Arc::new(NameData::Str(pre, s, hasher.finish())))
  }

  pub fn num(pre: Name, n: u64) -> Self {
    let hasher = &mut FxHasher::default();
    (11, pre.get_hash(), n).hash(hasher);
    Name(Arc::new(NameData::Num(pre, n, hasher.finish())))
  }

  pub fn is_anonymous(&self) -> bool {
    matches!(self.as_data(), NameData::Anonymous)
  }

  pub fn prefix(&self) -> Option<&Name> {
    match self.as_data() {
      NameData::Anonymous => None,
      NameData::Str(pre, ..) | NameData::Num(pre, ..) => Some(pre),
    }
  }
}

impl Hash for Name {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.get_hash().hash(state);
  }
}

/// Splits on `.`; purely numeric components become `Num` segments.
impl From<&str> for Name {
  fn from(s: &str) -> Self {
    s.split('.').filter(|c| !c.is_empty()).fold(Name::anon(), |pre, c| {
      match c.parse::<u64>() {
        Ok(n) => Name::num(pre, n),
        Err(_) => Name::str(pre, c),
      }
    })
  }
}

impl fmt::Display for Name {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.as_data() {
      NameData::Anonymous => write!(f, "[anonymous]"),
      NameData::Str(pre, s, _) if pre.is_anonymous() => write!(f, "{s}"),
      NameData::Num(pre, n, _) if pre.is_anonymous() => write!(f, "{n}"),
      NameData::Str(pre, s, _) => write!(f, "{pre}.{s}"),
      NameData::Num(pre, n, _) => write!(f, "{pre}.{n}"),
    }
  }
}
