use std::fmt;

use super::ResourceKind;

/// Backend-issued handle for a created resource.
///
/// Not `Clone`: a handle is owned by exactly one reconciler
/// entry, which is the only party allowed to update or delete it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    kind: ResourceKind,
    id: String,
}

impl ResourceHandle {
    /// Issue a handle. Only backends should call this.
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}
