use std::fmt;

/// Kinds of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagKind {
    Auth,
    Order,
    Stock,
    Location,
    User,
}

impl TagKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "Auth",
            Self::Order => "Order",
            Self::Stock => "Stock",
            Self::Location => "Location",
            Self::User => "User",
        }
    }
}

/// A cache tag: a kind, optionally narrowed to one id.
///
/// Invalidating a bare kind hits every entry that provided a tag of that
/// kind. Invalidating a kind with an id hits only entries that provided
/// exactly that tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheTag {
    pub kind: TagKind,
    pub id: Option<String>,
}

impl CacheTag {
    #[must_use]
    pub const fn kind(kind: TagKind) -> Self {
        Self { kind, id: None }
    }

    #[must_use]
    pub fn id(kind: TagKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    /// Whether invalidating `self` hits an entry that provided `provided`.
    #[must_use]
    pub fn covers(&self, provided: &CacheTag) -> bool {
        self.kind == provided.kind && (self.id.is_none() || self.id == provided.id)
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{id}", self.kind.as_str()),
            None => f.write_str(self.kind.as_str()),
        }
    }
}
