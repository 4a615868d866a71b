use std::fmt;

use serde::{Deserialize, Serialize};

/// The four resource kinds provisioned per catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    DataSource,
    Importer,
    Context,
    MappingResource,
}

impl ResourceKind {
    /// All kinds, in provisioning order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::DataSource,
        ResourceKind::Importer,
        ResourceKind::MappingResource,
        ResourceKind::Context,
    ];

    /// Backend factory that instantiates resources of this kind.
    pub fn factory(self) -> &'static str {
        match self {
            ResourceKind::DataSource => "catalogd.jdbc.datasource.h2",
            ResourceKind::Importer => "catalogd.jdbc.importer.csv",
            ResourceKind::Context => "catalogd.rolap.context",
            ResourceKind::MappingResource => "catalogd.mapping.emf",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::DataSource => "data-source",
            ResourceKind::Importer => "importer",
            ResourceKind::Context => "context",
            ResourceKind::MappingResource => "mapping",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
