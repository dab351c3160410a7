//! Resource manifest parsing and comparison
//!
//! A manifest maps URL-relative resource paths to opaque content digests.
//! It is produced at deploy time and treated as immutable input; two
//! manifests are compared by key and digest equality only.

use crate::error::{KitbagError, KitbagResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Path of the document entry point. Every manifest must carry a synonym
/// entry under this key mirroring the entry point's digest.
pub const ROOT_PATH: &str = "/";

/// Validate an origin and drop any trailing slash
pub fn normalize_origin(raw: &str) -> KitbagResult<String> {
    let origin = raw.trim_end_matches('/');
    if origin.is_empty() {
        return Err(KitbagError::OriginInvalid {
            origin: raw.to_string(),
            reason: "origin is empty".to_string(),
        });
    }
    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        return Err(KitbagError::OriginInvalid {
            origin: raw.to_string(),
            reason: "origin must start with http:// or https://".to_string(),
        });
    }
    Ok(origin.to_string())
}

/// Mapping from resource path to content digest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    entries: HashMap<String, String>,
}

impl ResourceManifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest from path/digest pairs
    pub fn from_entries<P, D>(entries: impl IntoIterator<Item = (P, D)>) -> Self
    where
        P: Into<String>,
        D: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(p, d)| (p.into(), d.into()))
                .collect(),
        }
    }

    /// Parse a manifest from its JSON wire format (a flat object)
    pub fn parse(content: &str) -> KitbagResult<Self> {
        serde_json::from_str(content).map_err(|e| KitbagError::ManifestInvalid {
            reason: e.to_string(),
        })
    }

    /// Serialize to the JSON wire format
    pub fn to_json(&self) -> KitbagResult<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Digest recorded for a path, if the path is declared
    pub fn digest(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Whether a path is declared in this manifest
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All declared paths, in no particular order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of declared resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest declares nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the wire-format requirement that the root synonym entry exists
    pub fn validate(&self) -> KitbagResult<()> {
        if !self.contains(ROOT_PATH) {
            return Err(KitbagError::ManifestInvalid {
                reason: format!("missing root entry \"{}\"", ROOT_PATH),
            });
        }
        Ok(())
    }

    /// Diff this manifest (the baseline) against a newer one
    pub fn diff(&self, newer: &ResourceManifest) -> ManifestDiff {
        let mut diff = ManifestDiff::default();

        for (path, digest) in &newer.entries {
            match self.entries.get(path) {
                None => diff.added.push(path.clone()),
                Some(old) if old != digest => diff.changed.push(path.clone()),
                Some(_) => diff.unchanged.push(path.clone()),
            }
        }
        for path in self.entries.keys() {
            if !newer.contains(path) {
                diff.removed.push(path.clone());
            }
        }

        diff.added.sort();
        diff.changed.sort();
        diff.removed.sort();
        diff.unchanged.sort();
        diff
    }
}

/// Path sets separating two manifest generations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    /// Paths only the newer manifest declares
    pub added: Vec<String>,
    /// Paths declared by both, with differing digests
    pub changed: Vec<String>,
    /// Paths only the baseline declares
    pub removed: Vec<String>,
    /// Paths declared by both, with equal digests
    pub unchanged: Vec<String>,
}

impl ManifestDiff {
    /// Whether the two generations describe the same deployed state
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Deployment description injected into the reconciler: the origin the
/// resources are served from, the manifest of the current generation, and
/// the core shell staged eagerly on install.
#[derive(Debug, Clone)]
pub struct Deployment {
    origin: String,
    manifest: ResourceManifest,
    core_shell: Vec<String>,
}

impl Deployment {
    /// Create a deployment. The origin loses any trailing slash; every
    /// core shell path must be declared in the manifest.
    pub fn new(
        origin: impl Into<String>,
        manifest: ResourceManifest,
        core_shell: Vec<String>,
    ) -> KitbagResult<Self> {
        let origin = normalize_origin(&origin.into())?;
        for path in &core_shell {
            if !manifest.contains(path) {
                return Err(KitbagError::CoreShellUndeclared(path.clone()));
            }
        }

        Ok(Self {
            origin,
            manifest,
            core_shell,
        })
    }

    /// Origin without a trailing slash, e.g. `https://app.example.com`
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Manifest of this generation
    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    /// Paths staged eagerly during install
    pub fn core_shell(&self) -> &[String] {
        &self.core_shell
    }

    /// Absolute URL a resource path resolves to
    pub fn resource_url(&self, path: &str) -> String {
        if path == ROOT_PATH {
            format!("{}/", self.origin)
        } else {
            format!("{}/{}", self.origin, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "/": "d41d8cd98f00b204e9800998ecf8427e",
        "index.html": "d41d8cd98f00b204e9800998ecf8427e",
        "main.js": "5f2a0bd23f9e6c3b8a91c44e7d80a1aa",
        "assets/fonts.css": "dc3d03800ccca4601324923c0b1d6d57"
    }"#;

    fn sample_manifest() -> ResourceManifest {
        ResourceManifest::parse(SAMPLE).unwrap()
    }

    // ---- parsing tests ----

    #[test]
    fn parse_valid_manifest() {
        let manifest = sample_manifest();
        assert_eq!(manifest.len(), 4);
        assert_eq!(
            manifest.digest("main.js"),
            Some("5f2a0bd23f9e6c3b8a91c44e7d80a1aa")
        );
        assert!(manifest.contains("/"));
        assert!(!manifest.contains("missing.js"));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        let result = ResourceManifest::parse("{not json");
        assert!(matches!(
            result,
            Err(KitbagError::ManifestInvalid { .. })
        ));
    }

    #[test]
    fn parse_rejects_non_object() {
        assert!(ResourceManifest::parse("[1, 2]").is_err());
    }

    #[test]
    fn json_roundtrip() {
        let manifest = sample_manifest();
        let json = manifest.to_json().unwrap();
        let back = ResourceManifest::parse(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn validate_requires_root_entry() {
        assert!(sample_manifest().validate().is_ok());

        let no_root = ResourceManifest::from_entries([("index.html", "abc")]);
        assert!(no_root.validate().is_err());
    }

    #[test]
    fn percent_encoded_paths_are_opaque() {
        let manifest =
            ResourceManifest::from_entries([("assets/fonts/My%20Font.ttf", "aa11")]);
        assert!(manifest.contains("assets/fonts/My%20Font.ttf"));
        assert!(!manifest.contains("assets/fonts/My Font.ttf"));
    }

    // ---- diff tests ----

    #[test]
    fn diff_separates_generations() {
        let old = ResourceManifest::from_entries([
            ("/", "r1"),
            ("app.js", "a1"),
            ("style.css", "c1"),
            ("old.js", "o1"),
        ]);
        let new = ResourceManifest::from_entries([
            ("/", "r1"),
            ("app.js", "a1"),
            ("style.css", "c2"),
            ("fresh.js", "f1"),
        ]);

        let diff = old.diff(&new);
        assert_eq!(diff.added, vec!["fresh.js"]);
        assert_eq!(diff.changed, vec!["style.css"]);
        assert_eq!(diff.removed, vec!["old.js"]);
        assert_eq!(diff.unchanged, vec!["/", "app.js"]);
        assert!(!diff.is_unchanged());
    }

    #[test]
    fn diff_of_equal_manifests_is_unchanged() {
        let manifest = sample_manifest();
        let diff = manifest.diff(&manifest.clone());
        assert!(diff.is_unchanged());
        assert_eq!(diff.unchanged.len(), 4);
    }

    // ---- deployment tests ----

    fn sample_deployment() -> Deployment {
        Deployment::new(
            "https://app.example.com",
            sample_manifest(),
            vec!["/".to_string(), "main.js".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn deployment_trims_trailing_slash() {
        let deployment =
            Deployment::new("https://app.example.com/", sample_manifest(), vec![]).unwrap();
        assert_eq!(deployment.origin(), "https://app.example.com");
    }

    #[test]
    fn deployment_rejects_empty_origin() {
        let result = Deployment::new("", sample_manifest(), vec![]);
        assert!(matches!(result, Err(KitbagError::OriginInvalid { .. })));
    }

    #[test]
    fn deployment_rejects_unscheme_origin() {
        let result = Deployment::new("app.example.com", sample_manifest(), vec![]);
        assert!(matches!(result, Err(KitbagError::OriginInvalid { .. })));
    }

    #[test]
    fn deployment_rejects_undeclared_core_path() {
        let result = Deployment::new(
            "https://app.example.com",
            sample_manifest(),
            vec!["not-declared.js".to_string()],
        );
        assert!(matches!(
            result,
            Err(KitbagError::CoreShellUndeclared(path)) if path == "not-declared.js"
        ));
    }

    #[test]
    fn resource_url_resolution() {
        let deployment = sample_deployment();
        assert_eq!(deployment.resource_url("/"), "https://app.example.com/");
        assert_eq!(
            deployment.resource_url("assets/fonts.css"),
            "https://app.example.com/assets/fonts.css"
        );
    }
}
