//! Access-path resolution: symbolic path names to concrete file paths.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PathError, PathResult};

/// Resolves a symbolic access name plus keywords to a file path.
pub trait PathResolver: Send + Sync {
    /// Build the path for `name`. Fails naming every keyword the template
    /// needs that `keywords` does not supply.
    fn resolve(&self, name: &str, keywords: &BTreeMap<String, String>) -> PathResult<PathBuf>;

    /// The keywords `name` requires.
    fn keywords(&self, name: &str) -> PathResult<Vec<String>>;
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder pattern"))
}

/// Resolves names from `{key}` templates. `{root}` is the data root unless
/// a `root` keyword is supplied.
#[derive(Clone, Debug, Default)]
pub struct TemplateResolver {
    root: PathBuf,
    templates: BTreeMap<String, String>,
}

impl TemplateResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            templates: BTreeMap::new(),
        }
    }

    pub fn with_template(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(name.into(), template.into());
        self
    }

    pub fn with_templates(mut self, templates: impl IntoIterator<Item = (String, String)>) -> Self {
        self.templates.extend(templates);
        self
    }

    fn template(&self, name: &str) -> PathResult<&str> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| PathError::UnknownName(name.to_string()))
    }
}

impl PathResolver for TemplateResolver {
    fn resolve(&self, name: &str, keywords: &BTreeMap<String, String>) -> PathResult<PathBuf> {
        let template = self.template(name)?;
        let root = self.root.to_string_lossy();
        let mut missing = Vec::new();
        let path = placeholder_pattern().replace_all(template, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            match keywords.get(key) {
                Some(value) => value.clone(),
                None if key == "root" => root.to_string(),
                None => {
                    if !missing.iter().any(|m| m == key) {
                        missing.push(key.to_string());
                    }
                    String::new()
                }
            }
        });
        if !missing.is_empty() {
            return Err(PathError::MissingKeywords {
                name: name.to_string(),
                missing,
            });
        }
        Ok(PathBuf::from(path.into_owned()))
    }

    fn keywords(&self, name: &str) -> PathResult<Vec<String>> {
        let template = self.template(name)?;
        let mut keys: Vec<String> = Vec::new();
        for caps in placeholder_pattern().captures_iter(template) {
            let key = &caps[1];
            if key != "root" && !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TemplateResolver {
        TemplateResolver::new("/sas").with_template(
            "mangacube",
            "{root}/mangawork/manga/spectro/redux/{drpver}/{plate}/stack/manga-{plate}-{ifu}-LOGCUBE.fits",
        )
    }

    fn keywords(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn fills_template() {
        let path = resolver()
            .resolve("mangacube", &keywords(&[("drpver", "v2_4_3"), ("plate", "8485"), ("ifu", "1901")]))
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/sas/mangawork/manga/spectro/redux/v2_4_3/8485/stack/manga-8485-1901-LOGCUBE.fits")
        );
    }

    #[test]
    fn reports_missing_keywords_once() {
        let err = resolver()
            .resolve("mangacube", &keywords(&[("drpver", "v2_4_3")]))
            .unwrap_err();
        match err {
            PathError::MissingKeywords { name, missing } => {
                assert_eq!(name, "mangacube");
                assert_eq!(missing, vec!["plate", "ifu"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_name() {
        assert!(matches!(
            resolver().resolve("drpall", &BTreeMap::new()),
            Err(PathError::UnknownName(_))
        ));
    }

    #[test]
    fn lists_keywords() {
        assert_eq!(resolver().keywords("mangacube").unwrap(), vec!["drpver", "plate", "ifu"]);
    }
}
