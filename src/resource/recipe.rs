//! Creation recipes: the property sets each resource kind is created with.
//!
//! Keys here must match what the backend factories expect. Every reference
//! between resources is a selector filter, never a backend id.

use std::path::Path;

use uuid::Uuid;

use crate::catalog::DATA_DIR;
use crate::correlation::{CORRELATION_KEY, CorrelationToken, Selector};

use super::{Properties, PropertyValue};

/// Suffix marking a property as a reference selector.
pub const TARGET_SUFFIX: &str = ".target";

pub const DATASOURCE_IDENTIFIER: &str = "identifier";
pub const DATASOURCE_FILESYSTEM: &str = "pluggable.filesystem";
/// In-memory backing store option for the data source.
pub const FILESYSTEM_MEMORY: &str = "memFS";

pub const IMPORTER_PATH: &str = "watcher.path";
pub const IMPORTER_DATA_SOURCE: &str = "dataSource";

pub const MAPPING_RESOURCE_URL: &str = "resource.url";
/// File the mapping resource points at, inside the mapping directory.
pub const MAPPING_FILE: &str = "catalog.xmi";

pub const CONTEXT_DATA_SOURCE: &str = "dataSource";
pub const CONTEXT_MAPPING_SUPPLIER: &str = "catalogMappingSupplier";
pub const CONTEXT_EXPRESSION_COMPILER: &str = "expressionCompilerFactory";
pub const CONTEXT_DIALECT_FACTORY: &str = "dialectFactory";
pub const CONTEXT_MDX_PARSER: &str = "mdxParserProvider";
pub const CONTEXT_NAME: &str = "name";
pub const CONTEXT_DESCRIPTION: &str = "description";
pub const CONTEXT_CATALOG_PATH: &str = "catalog.path";
pub const CONTEXT_USE_AGGREGATES: &str = "useAggregates";

/// Component implementing the expression compiler, shared by every context.
pub const EXPRESSION_COMPILER_COMPONENT: &str =
    "org.eclipse.daanse.olap.calc.base.compiler.BaseExpressionCompilerFactory";
/// Component implementing the MDX parser, shared by every context.
pub const MDX_PARSER_COMPONENT: &str = "org.eclipse.daanse.mdx.parser.ccc.MdxParserProviderImpl";
pub const DIALECT_NAME_KEY: &str = "dialect.name";
pub const DIALECT_NAME: &str = "H2";
pub const COMPONENT_NAME_KEY: &str = "component.name";

/// Property key of the selector a consumer uses to reference `reference`.
pub fn target_key(reference: &str) -> String {
    format!("{reference}{TARGET_SUFFIX}")
}

fn put(props: &mut Properties, key: impl Into<String>, value: impl Into<PropertyValue>) {
    props.insert(key.into(), value.into());
}

/// Fresh unique id for a resource or a data source identifier.
pub fn unique_id() -> String {
    Uuid::new_v4().to_string()
}

/// Data source backed by an in-memory store, tagged with the token.
pub fn data_source(token: &CorrelationToken) -> Properties {
    let mut props = Properties::new();
    put(&mut props, DATASOURCE_IDENTIFIER, unique_id());
    put(&mut props, DATASOURCE_FILESYSTEM, FILESYSTEM_MEMORY);
    put(&mut props, CORRELATION_KEY, token.as_str());
    props
}

/// Bulk importer reading `<catalog>/data` into the correlated data source.
pub fn importer(catalog: &Path, token: &CorrelationToken) -> Properties {
    let mut props = Properties::new();
    put(
        &mut props,
        IMPORTER_PATH,
        catalog.join(DATA_DIR).to_string_lossy().into_owned(),
    );
    put(
        &mut props,
        target_key(IMPORTER_DATA_SOURCE),
        token.selector().to_string(),
    );
    props
}

/// Mapping provider pointing at `<mapping_dir>/catalog.xmi`, tagged with the token.
pub fn mapping(mapping_dir: &Path, token: &CorrelationToken) -> Properties {
    let file = mapping_dir.join(MAPPING_FILE);
    let url = std::path::absolute(&file).unwrap_or(file);

    let mut props = Properties::new();
    put(&mut props, MAPPING_RESOURCE_URL, url.to_string_lossy().into_owned());
    put(&mut props, CORRELATION_KEY, token.as_str());
    props
}

/// Execution context wiring the correlated data source and mapping together
/// with the shared collaborators.
pub fn context(catalog: &Path, token: &CorrelationToken) -> Properties {
    let correlated = token.selector().to_string();
    let catalog_path = catalog.to_string_lossy().into_owned();
    let name = if catalog_path.is_empty() {
        format!("not_set{}", unique_id())
    } else {
        catalog_path.clone()
    };

    let mut props = Properties::new();
    put(&mut props, target_key(CONTEXT_DATA_SOURCE), correlated.clone());
    put(&mut props, target_key(CONTEXT_MAPPING_SUPPLIER), correlated);
    put(
        &mut props,
        target_key(CONTEXT_EXPRESSION_COMPILER),
        Selector::equals(COMPONENT_NAME_KEY, EXPRESSION_COMPILER_COMPONENT).to_string(),
    );
    put(
        &mut props,
        target_key(CONTEXT_DIALECT_FACTORY),
        Selector::equals(DIALECT_NAME_KEY, DIALECT_NAME).to_string(),
    );
    put(
        &mut props,
        target_key(CONTEXT_MDX_PARSER),
        Selector::equals(COMPONENT_NAME_KEY, MDX_PARSER_COMPONENT).to_string(),
    );
    put(&mut props, CONTEXT_NAME, name);
    put(
        &mut props,
        CONTEXT_DESCRIPTION,
        format!("Catalog served from {catalog_path}"),
    );
    put(&mut props, CONTEXT_CATALOG_PATH, catalog_path);
    put(&mut props, CONTEXT_USE_AGGREGATES, true);
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_data_source_recipe() {
        let token = CorrelationToken::mint();
        let props = data_source(&token);

        assert_eq!(props[CORRELATION_KEY].as_str(), Some(token.as_str()));
        assert_eq!(props[DATASOURCE_FILESYSTEM].as_str(), Some(FILESYSTEM_MEMORY));
        assert!(props.contains_key(DATASOURCE_IDENTIFIER));
    }

    #[test]
    fn test_data_source_identifiers_differ() {
        let token = CorrelationToken::mint();
        assert_ne!(
            data_source(&token)[DATASOURCE_IDENTIFIER],
            data_source(&token)[DATASOURCE_IDENTIFIER]
        );
    }

    #[test]
    fn test_importer_references_data_source_by_selector() {
        let token = CorrelationToken::mint();
        let props = importer(Path::new("/catalogs/sales"), &token);

        assert_eq!(
            props[IMPORTER_PATH].as_str(),
            Some(PathBuf::from("/catalogs/sales/data").to_string_lossy().as_ref())
        );
        assert_eq!(
            props["dataSource.target"].as_str(),
            Some(format!("(catalog.correlation={token})").as_str())
        );
    }

    #[test]
    fn test_mapping_url_is_absolute() {
        let token = CorrelationToken::mint();
        let props = mapping(Path::new("relative/mapping"), &token);

        let url = PathBuf::from(props[MAPPING_RESOURCE_URL].as_str().unwrap());
        assert!(url.is_absolute());
        assert!(url.ends_with("relative/mapping/catalog.xmi"));
        assert_eq!(props[CORRELATION_KEY].as_str(), Some(token.as_str()));
    }

    #[test]
    fn test_context_recipe() {
        let token = CorrelationToken::mint();
        let props = context(Path::new("/catalogs/sales"), &token);
        let correlated = token.selector().to_string();

        assert_eq!(
            props[&target_key(CONTEXT_DATA_SOURCE)].as_str(),
            Some(correlated.as_str())
        );
        assert_eq!(
            props[&target_key(CONTEXT_MAPPING_SUPPLIER)].as_str(),
            Some(correlated.as_str())
        );
        assert_eq!(
            props[&target_key(CONTEXT_MDX_PARSER)].as_str(),
            Some(format!("(component.name={MDX_PARSER_COMPONENT})").as_str())
        );
        assert_eq!(props[CONTEXT_NAME].as_str(), Some("/catalogs/sales"));
        assert_eq!(props[CONTEXT_USE_AGGREGATES].as_bool(), Some(true));
    }

    #[test]
    fn test_context_name_fallback() {
        let token = CorrelationToken::mint();
        let props = context(Path::new(""), &token);
        assert!(props[CONTEXT_NAME].as_str().unwrap().starts_with("not_set"));
    }

    #[test]
    fn test_fixed_collaborators_shared_across_catalogs() {
        let a = context(Path::new("/c/a"), &CorrelationToken::mint());
        let b = context(Path::new("/c/b"), &CorrelationToken::mint());
        for key in [CONTEXT_EXPRESSION_COMPILER, CONTEXT_DIALECT_FACTORY, CONTEXT_MDX_PARSER] {
            assert_eq!(a[&target_key(key)], b[&target_key(key)]);
        }
    }
}
