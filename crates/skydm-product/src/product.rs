//! Versioned products: expansion into per-version files and changelogs.
//!
//! A [`Product`] declares a list of versions plus base attributes, and
//! per-version overrides in its changelog. Expanding it yields one
//! [`ExpandedFile`] per version, each located either from an `example`
//! path with the version token substituted or from an access-path
//! template. Both the expansion and the changelog are cached on the
//! product until [`Product::refresh`] is called.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_yaml::Value;
use skydm_diff::{ChangeLog, ChangelogEngine, DiffOptions, DiffTarget};
use skydm_format::{FileStructure, FormatBackend};
use skydm_fuzzy::{FuzzyKey, FuzzyList, Named, DEFAULT_MIN_SCORE};
use skydm_types::{Datatype, FileKind, Warning, WarningSink};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ProductError, ProductResult, SchemaError};
use crate::resolver::{PathResolver, TemplateResolver};
use crate::schema::{describe, scalar_string, Record};

/// Products, looked up by lowercased name.
pub type ProductList = FuzzyList<Product>;

/// Expanded files of one product, looked up by lowercased version.
pub type ObjectList = FuzzyList<ExpandedFile>;

pub fn product_list(products: impl IntoIterator<Item = Product>) -> ProductList {
    FuzzyList::from_items(products, |p| p.name().to_lowercase())
}

pub fn object_list(files: impl IntoIterator<Item = ExpandedFile>) -> ObjectList {
    FuzzyList::from_items(files, |f| f.version().to_lowercase())
}

// ---------------------------------------------------------------------------
// ProductContext
// ---------------------------------------------------------------------------

/// The services a product expands and diffs itself with.
#[derive(Clone)]
pub struct ProductContext {
    data_root: PathBuf,
    resolver: Arc<dyn PathResolver>,
    backend: Arc<dyn FormatBackend>,
    warnings: Arc<dyn WarningSink>,
    options: DiffOptions,
    min_score: u8,
}

impl fmt::Debug for ProductContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductContext")
            .field("data_root", &self.data_root)
            .field("options", &self.options)
            .field("min_score", &self.min_score)
            .finish_non_exhaustive()
    }
}

impl ProductContext {
    pub fn new(backend: Arc<dyn FormatBackend>, warnings: Arc<dyn WarningSink>) -> Self {
        Self {
            data_root: PathBuf::from("."),
            resolver: Arc::new(TemplateResolver::new(".")),
            backend,
            warnings,
            options: DiffOptions::default(),
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    pub fn from_config(config: &Config, backend: Arc<dyn FormatBackend>, warnings: Arc<dyn WarningSink>) -> Self {
        Self {
            data_root: config.data_root(),
            resolver: Arc::new(config.resolver()),
            backend,
            warnings,
            options: config.diff_options(),
            min_score: config.min_score,
        }
    }

    pub fn with_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = root.into();
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn backend(&self) -> &Arc<dyn FormatBackend> {
        &self.backend
    }

    pub fn warnings(&self) -> &Arc<dyn WarningSink> {
        &self.warnings
    }

    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    pub fn engine(&self) -> ChangelogEngine {
        ChangelogEngine::new(self.backend.clone(), self.warnings.clone()).with_options(self.options)
    }
}

// ---------------------------------------------------------------------------
// ExpandedFile
// ---------------------------------------------------------------------------

/// Where an expanded file's contents come from.
#[derive(Clone, Debug, PartialEq)]
pub enum Backing {
    File { kind: FileKind, path: PathBuf },
    /// No file could be located; only the product name and version are known.
    Placeholder,
}

/// One product at one version.
#[derive(Clone, Debug)]
pub struct ExpandedFile {
    product: String,
    version: String,
    datatype: Datatype,
    backing: Backing,
    file_exists: bool,
    attributes: Record,
    structure: OnceCell<FileStructure>,
}

impl ExpandedFile {
    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    pub fn fullpath(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File { path, .. } => Some(path),
            Backing::Placeholder => None,
        }
    }

    pub fn file_exists(&self) -> bool {
        self.file_exists
    }

    pub fn is_placeholder(&self) -> bool {
        self.backing == Backing::Placeholder
    }

    /// Attributes resolved for this version.
    pub fn attributes(&self) -> &Record {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// The file's structure, read through `backend` on first use.
    pub fn structure(&self, backend: &dyn FormatBackend) -> ProductResult<&FileStructure> {
        let Backing::File { kind, path } = &self.backing else {
            return Err(ProductError::NoFile {
                product: self.product.clone(),
                version: self.version.clone(),
            });
        };
        if let Some(structure) = self.structure.get() {
            return Ok(structure);
        }
        let structure = backend.open(path, *kind)?;
        Ok(self.structure.get_or_init(|| structure))
    }
}

impl DiffTarget for ExpandedFile {
    fn version(&self) -> &str {
        &self.version
    }

    fn path(&self) -> Option<&Path> {
        self.fullpath()
    }

    fn file_exists(&self) -> bool {
        self.file_exists
    }
}

impl fmt::Display for ExpandedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}({}, version={}, exists={})>",
            self.datatype, self.product, self.version, self.file_exists
        )
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

enum Location {
    Path(PathBuf),
    Unknown(&'static str),
}

/// A versioned data product.
#[derive(Clone, Debug)]
pub struct Product {
    key: String,
    name: String,
    datatype: Datatype,
    versions: Vec<String>,
    attributes: Record,
    changelog: IndexMap<String, Record>,
    repr_fields: Vec<String>,
    context: ProductContext,
    expanded: Option<ObjectList>,
    changes: Option<(Option<Vec<String>>, ChangeLog)>,
}

impl Product {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        datatype: impl Into<Datatype>,
        versions: impl IntoIterator<Item = S>,
        context: ProductContext,
    ) -> Self {
        let name = name.into();
        Self {
            key: name.to_lowercase(),
            name,
            datatype: datatype.into(),
            versions: versions.into_iter().map(Into::into).collect(),
            attributes: Record::new(),
            changelog: IndexMap::new(),
            repr_fields: Vec::new(),
            context,
            expanded: None,
            changes: None,
        }
    }

    /// Build a product from a validated record. `changelog` holds the
    /// already expanded overrides of each version.
    pub fn from_record(
        key: &str,
        mut record: Record,
        changelog: IndexMap<String, Record>,
        repr_fields: Vec<String>,
        context: ProductContext,
    ) -> ProductResult<Self> {
        record.shift_remove("changelog");
        let versions = match record.shift_remove("versions") {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
            _ => {
                return Err(SchemaError::MissingField {
                    schema: key.to_string(),
                    field: "versions".into(),
                }
                .into())
            }
        };
        let datatype = record
            .get("datatype")
            .and_then(scalar_string)
            .map(Datatype::from)
            .ok_or_else(|| SchemaError::MissingField {
                schema: key.to_string(),
                field: "datatype".into(),
            })?;
        let name = record
            .get("name")
            .and_then(scalar_string)
            .unwrap_or_else(|| key.to_string());

        Ok(Self {
            key: key.to_string(),
            name,
            datatype,
            versions,
            attributes: record,
            changelog,
            repr_fields,
            context,
            expanded: None,
            changes: None,
        })
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the overrides for `version`.
    pub fn with_overrides(mut self, version: impl Into<String>, overrides: Record) -> Self {
        self.changelog.insert(version.into(), overrides);
        self
    }

    /// The key the product is declared under in its products file.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Base attributes, without the changelog and versions.
    pub fn attributes(&self) -> &Record {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Per-version overrides, in version order.
    pub fn overrides(&self) -> &IndexMap<String, Record> {
        &self.changelog
    }

    pub fn context(&self) -> &ProductContext {
        &self.context
    }

    /// Drop the cached expansion and changelog.
    pub fn refresh(&mut self) {
        self.expanded = None;
        self.changes = None;
    }

    /// One [`ExpandedFile`] per version, in version order. Cached.
    pub fn expand_product(&mut self) -> ProductResult<&ObjectList> {
        let list = self.take_expansion()?;
        Ok(self.expanded.insert(list))
    }

    /// The expanded file for a loosely spelled version label.
    pub fn version<'k>(&mut self, key: impl Into<FuzzyKey<'k>>) -> ProductResult<&ExpandedFile> {
        Ok(self.expand_product()?.get(key)?)
    }

    /// Diffs between consecutive versions whose files exist, oldest first.
    ///
    /// `versions` restricts the changelog to a subset; every requested
    /// version must be one of the product's. The result is cached per
    /// subset until `refresh` is set or [`Product::refresh`] is called.
    pub fn compute_changelog(&mut self, versions: Option<&[String]>, refresh: bool) -> ProductResult<&ChangeLog> {
        if refresh {
            self.changes = None;
        }
        let requested = versions.map(<[String]>::to_vec);
        let log = match self.changes.take() {
            Some((key, log)) if key == requested => log,
            _ => {
                let list = self.take_expansion()?;
                let expanded = &*self.expanded.insert(list);
                changelog_for(&self.name, &self.datatype, &self.context, expanded, requested.as_deref())?
            }
        };
        Ok(&self.changes.insert((requested, log)).1)
    }

    fn take_expansion(&mut self) -> ProductResult<ObjectList> {
        match self.expanded.take() {
            Some(list) => Ok(list),
            None => Ok(object_list(self.expand()?).with_min_score(self.context.min_score)),
        }
    }

    fn expand(&self) -> ProductResult<Vec<ExpandedFile>> {
        let token = self
            .attributes
            .get("example")
            .and_then(Value::as_str)
            .and_then(|example| version_token(example, &self.versions));

        let mut files = Vec::with_capacity(self.versions.len());
        for version in &self.versions {
            let mut attributes = self.attributes.clone();
            let overrides = self.changelog.get(version);
            if let Some(overrides) = overrides {
                attributes.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            let example_overridden = overrides.is_some_and(|o| o.contains_key("example"));
            if let (Some(token), false) = (token, example_overridden) {
                if let Some(Value::String(example)) = attributes.get_mut("example") {
                    *example = example.replace(token, version);
                }
            }
            files.push(self.create_file(version, attributes)?);
        }
        info!(product = %self.name, versions = files.len(), "expanded product");
        Ok(files)
    }

    fn create_file(&self, version: &str, attributes: Record) -> ProductResult<ExpandedFile> {
        let datatype = attributes
            .get("datatype")
            .and_then(scalar_string)
            .map(Datatype::from)
            .unwrap_or_else(|| self.datatype.clone());

        let location = match datatype.file_kind() {
            Some(kind) => self.locate(version, &attributes)?.map_kind(kind),
            None => Err("datatype has no file backing"),
        };
        let backing = match location {
            Ok(backing) => backing,
            Err(reason) => {
                self.context.warnings.warn(Warning::PlaceholderFallback {
                    product: self.name.clone(),
                    version: version.to_string(),
                    reason: reason.to_string(),
                });
                Backing::Placeholder
            }
        };
        let file_exists = match &backing {
            Backing::File { path, .. } => self.context.backend.exists(path),
            Backing::Placeholder => false,
        };
        debug!(product = %self.name, %version, file_exists, "created expanded file");

        Ok(ExpandedFile {
            product: self.name.clone(),
            version: version.to_string(),
            datatype,
            backing,
            file_exists,
            attributes,
            structure: OnceCell::new(),
        })
    }

    /// Find the file for `version`. An access path with keywords wins over
    /// an example path.
    fn locate(&self, version: &str, attributes: &Record) -> ProductResult<Location> {
        let example = attributes.get("example").and_then(Value::as_str);
        let path_name = attributes.get("path_name").and_then(Value::as_str);
        let kwargs = attributes.get("path_kwargs").and_then(Value::as_mapping);

        match (path_name, example, kwargs) {
            (Some(name), _, Some(kwargs)) => {
                let mut keywords: std::collections::BTreeMap<String, String> = kwargs
                    .iter()
                    .filter_map(|(k, v)| Some((scalar_string(k)?, scalar_string(v)?)))
                    .collect();
                keywords.entry("version".into()).or_insert_with(|| version.to_string());
                Ok(Location::Path(self.context.resolver.resolve(name, &keywords)?))
            }
            (_, Some(example), _) => Ok(Location::Path(self.context.data_root.join(example))),
            (Some(_), None, None) => Ok(Location::Unknown("access path has no example or keywords")),
            (None, None, _) => Ok(Location::Unknown("no example or access path")),
        }
    }
}

impl Location {
    fn map_kind(self, kind: FileKind) -> Result<Backing, &'static str> {
        match self {
            Self::Path(path) => Ok(Backing::File { kind, path }),
            Self::Unknown(reason) => Err(reason),
        }
    }
}

/// The longest version label contained in `example`, first in order on ties.
fn version_token<'v>(example: &str, versions: &'v [String]) -> Option<&'v str> {
    let token = versions
        .iter()
        .filter(|v| !v.is_empty() && example.contains(v.as_str()))
        .fold(None, |best: Option<&String>, v| match best {
            Some(b) if b.len() >= v.len() => Some(b),
            _ => Some(v),
        });
    if token.is_none() {
        debug!(%example, "no version token in example; using it for every version");
    }
    token.map(String::as_str)
}

fn changelog_for(
    product: &str,
    datatype: &Datatype,
    context: &ProductContext,
    expanded: &ObjectList,
    requested: Option<&[String]>,
) -> ProductResult<ChangeLog> {
    let selected: Vec<&ExpandedFile> = match requested {
        None => expanded.iter().collect(),
        Some(versions) => {
            if let Some(missing) = versions.iter().find(|v| !expanded.iter().any(|f| &f.version == *v)) {
                return Err(ProductError::UnknownVersion {
                    product: product.to_string(),
                    version: missing.clone(),
                });
            }
            expanded.iter().filter(|f| versions.contains(&f.version)).collect()
        }
    };

    let existing: Vec<&ExpandedFile> = selected.iter().copied().filter(|f| f.file_exists).collect();
    if existing.len() < selected.len() {
        context.warnings.warn(Warning::IncompleteChangelog {
            product: product.to_string(),
            requested: selected.len(),
            existing: existing.len(),
        });
    }

    let Some(kind) = datatype.file_kind() else {
        debug!(%product, %datatype, "datatype has no file kind; empty changelog");
        return Ok(ChangeLog::default());
    };
    Ok(context.engine().compute_changelog(&existing, kind)?)
}

impl Named for Product {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Product({}", self.name)?;
        for field in self.repr_fields.iter().filter(|f| *f != "name") {
            if let Some(value) = self.attributes.get(field) {
                let value = scalar_string(value).unwrap_or_else(|| describe(value));
                write!(f, ", {field}={value}")?;
            }
        }
        f.write_str(")>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skydm_format::{CatalogStructure, DiskBackend, FitsBuilder, InMemoryBackend};
    use skydm_types::RecordingWarnings;
    use tracing_test::traced_test;

    fn disk_context(root: &Path, warnings: Arc<RecordingWarnings>) -> ProductContext {
        ProductContext::new(Arc::new(DiskBackend), warnings).with_data_root(root)
    }

    fn write_cube(root: &Path, version: &str, builder: FitsBuilder) {
        let dir = root.join("manga").join(version);
        std::fs::create_dir_all(&dir).unwrap();
        builder.write(&dir.join("cube.fits")).unwrap();
    }

    fn logcube(context: ProductContext) -> Product {
        Product::new("LogCube", "fits", ["v1", "v2", "v3"], context).with_attribute("example", "manga/v1/cube.fits")
    }

    #[test]
    fn expands_one_file_per_version() {
        let dir = tempfile::tempdir().unwrap();
        let warnings = Arc::new(RecordingWarnings::new());
        let mut product = logcube(disk_context(dir.path(), warnings.clone()));
        write_cube(dir.path(), "v2", FitsBuilder::new());

        let expanded = product.expand_product().unwrap();
        let versions: Vec<&str> = expanded.iter().map(ExpandedFile::version).collect();
        assert_eq!(versions, vec!["v1", "v2", "v3"]);
        assert_eq!(expanded[1].fullpath().unwrap(), dir.path().join("manga/v2/cube.fits"));
        assert!(!expanded[0].file_exists());
        assert!(expanded[1].file_exists());
        assert!(warnings.is_empty());
    }

    #[test]
    fn changelog_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let base = FitsBuilder::new().image("FLUX", &[4, 4]);
        write_cube(dir.path(), "v1", base.clone());
        write_cube(dir.path(), "v2", base.clone());
        write_cube(dir.path(), "v3", base.image("EXTRA", &[4]));

        let mut product = logcube(disk_context(dir.path(), Arc::new(RecordingWarnings::new())));
        let log = product.compute_changelog(None, false).unwrap();
        assert_eq!(log.keys(), vec!["diff_v1_v2", "diff_v2_v3"]);
        let last = log.get("diff_v2_v3").unwrap().as_fits().unwrap();
        assert_eq!(last.added_sections, vec!["EXTRA"]);
        assert_eq!(last.delta_count, 1);
        assert_eq!(log.get("diff_v1_v2").unwrap().as_fits().unwrap().delta_count, 0);
    }

    #[test]
    fn restricted_changelog_and_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        for version in ["v1", "v2", "v3"] {
            write_cube(dir.path(), version, FitsBuilder::new());
        }
        let mut product = logcube(disk_context(dir.path(), Arc::new(RecordingWarnings::new())));

        let subset = vec!["v1".to_string(), "v3".to_string()];
        let log = product.compute_changelog(Some(&subset), false).unwrap();
        assert_eq!(log.keys(), vec!["diff_v1_v3"]);

        let bad = vec!["v9".to_string()];
        let err = product.compute_changelog(Some(&bad), false).unwrap_err();
        assert!(matches!(err, ProductError::UnknownVersion { ref version, .. } if version == "v9"));
    }

    #[test]
    fn missing_files_make_changelog_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        write_cube(dir.path(), "v1", FitsBuilder::new());
        write_cube(dir.path(), "v3", FitsBuilder::new().image("EXTRA", &[2]));
        let warnings = Arc::new(RecordingWarnings::new());
        let mut product = logcube(disk_context(dir.path(), warnings.clone()));

        let log = product.compute_changelog(None, false).unwrap();
        assert_eq!(log.keys(), vec!["diff_v1_v3"]);
        assert_eq!(
            warnings.warnings(),
            vec![Warning::IncompleteChangelog {
                product: "LogCube".into(),
                requested: 3,
                existing: 2,
            }]
        );
    }

    #[test]
    fn changelog_is_cached_until_refresh() {
        let dir = tempfile::tempdir().unwrap();
        write_cube(dir.path(), "v1", FitsBuilder::new());
        write_cube(dir.path(), "v2", FitsBuilder::new());
        let mut product = logcube(disk_context(dir.path(), Arc::new(RecordingWarnings::new())));
        assert_eq!(product.compute_changelog(None, false).unwrap().len(), 1);

        write_cube(dir.path(), "v3", FitsBuilder::new());
        assert_eq!(product.compute_changelog(None, false).unwrap().len(), 1);
        // The expansion is cached too, so v3 still reads as missing.
        assert_eq!(product.compute_changelog(None, true).unwrap().len(), 1);

        product.refresh();
        assert_eq!(product.compute_changelog(None, false).unwrap().len(), 2);
    }

    #[test]
    fn overrides_apply_to_one_version() {
        let context = disk_context(Path::new("/sas"), Arc::new(RecordingWarnings::new()));
        let mut overrides = Record::new();
        overrides.insert("short".into(), Value::from("changed"));
        overrides.insert("example".into(), Value::from("manga/final/cube.fits"));
        let mut product = logcube(context)
            .with_attribute("short", "cube")
            .with_overrides("v3", overrides);

        let expanded = product.expand_product().unwrap();
        assert_eq!(expanded[0].attribute("short"), Some(&Value::from("cube")));
        assert_eq!(expanded[2].attribute("short"), Some(&Value::from("changed")));
        assert_eq!(expanded[2].fullpath().unwrap(), Path::new("/sas/manga/final/cube.fits"));
        assert_eq!(product.attribute("short"), Some(&Value::from("cube")));
    }

    #[test]
    fn access_path_with_keywords() {
        let resolver = TemplateResolver::new("/sas").with_template("drpall", "{root}/manga/{version}/drpall-{drpver}.csv");
        let context = ProductContext::new(Arc::new(InMemoryBackend::new()), Arc::new(RecordingWarnings::new()))
            .with_resolver(Arc::new(resolver));
        let kwargs: Value = serde_yaml::from_str("{drpver: v3_1_1}").unwrap();
        let mut product = Product::new("DRPall", "catalog", ["DR17"], context)
            .with_attribute("path_name", "drpall")
            .with_attribute("path_kwargs", kwargs);

        let file = product.version("dr17").unwrap();
        assert_eq!(file.fullpath().unwrap(), Path::new("/sas/manga/DR17/drpall-v3_1_1.csv"));
        assert!(!file.file_exists());
    }

    #[test]
    fn missing_access_keywords_are_an_error() {
        let resolver = TemplateResolver::new("/sas").with_template("drpall", "{root}/{drpver}/drpall.csv");
        let context = ProductContext::new(Arc::new(InMemoryBackend::new()), Arc::new(RecordingWarnings::new()))
            .with_resolver(Arc::new(resolver));
        let mut product = Product::new("DRPall", "catalog", ["DR17"], context)
            .with_attribute("path_name", "drpall")
            .with_attribute("path_kwargs", Value::Mapping(Default::default()));
        let err = product.expand_product().unwrap_err();
        assert!(err.to_string().contains("drpver"));
    }

    #[test]
    fn placeholders_when_nothing_locates_the_file() {
        let warnings = Arc::new(RecordingWarnings::new());
        let context = ProductContext::new(Arc::new(InMemoryBackend::new()), warnings.clone());
        let mut product = Product::new("Notes", "text", ["v1", "v2"], context.clone());
        let expanded = product.expand_product().unwrap();
        assert!(expanded.iter().all(ExpandedFile::is_placeholder));
        assert_eq!(warnings.len(), 2);
        assert!(product.compute_changelog(None, false).unwrap().is_empty());

        let mut bare = Product::new("Cube", "fits", ["v1"], context).with_attribute("path_name", "cube");
        assert!(bare.expand_product().unwrap()[0].is_placeholder());
        assert!(matches!(
            &warnings.warnings()[3],
            Warning::PlaceholderFallback { product, .. } if product == "Cube"
        ));
    }

    #[traced_test]
    #[test]
    fn placeholder_fallback_is_logged() {
        let context = ProductContext::new(Arc::new(InMemoryBackend::new()), Arc::new(RecordingWarnings::forwarding()));
        let mut product = Product::new("Notes", "text", ["v1"], context);
        product.expand_product().unwrap();
        assert!(logs_contain("cannot expand product Notes at version v1"));
    }

    #[test]
    fn structure_is_loaded_lazily() {
        let backend = Arc::new(InMemoryBackend::new());
        let warnings = Arc::new(RecordingWarnings::new());
        backend.insert(
            "/sas/dr17/drpall.csv",
            FileStructure::Catalog(CatalogStructure::new(vec!["plateifu".into()], 3)),
        );
        let context = ProductContext::new(backend.clone(), warnings).with_data_root("/sas");
        let mut product = Product::new("DRPall", "catalog", ["dr17"], context).with_attribute("example", "dr17/drpall.csv");
        let file = product.version(0usize).unwrap();
        assert!(file.file_exists());

        let structure = file.structure(backend.as_ref()).unwrap();
        assert_eq!(structure.as_catalog().unwrap().rows, 3);
        backend.remove(Path::new("/sas/dr17/drpall.csv"));
        assert!(file.structure(backend.as_ref()).is_ok());
    }

    #[test]
    fn longest_version_token_is_replaced() {
        let versions = vec!["v1".to_string(), "v1_1".to_string()];
        assert_eq!(version_token("data/v1_1/file.fits", &versions), Some("v1_1"));
        assert_eq!(version_token("data/file.fits", &versions), None);
    }

    #[test]
    fn product_list_looks_up_by_lowercased_name() {
        let context = ProductContext::new(Arc::new(InMemoryBackend::new()), Arc::new(RecordingWarnings::new()));
        let products = product_list([
            Product::new("LogCube", "fits", ["v1"], context.clone()),
            Product::new("DRPall", "catalog", ["v1"], context),
        ]);
        assert_eq!(products.names(), vec!["logcube", "drpall"]);
        assert_eq!(products.get("LogCube").unwrap().name(), "LogCube");
        assert_eq!(products.get("drpal").unwrap().name(), "DRPall");
    }
}
