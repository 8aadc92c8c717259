use apidoc::{ApidocError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for schema extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Plugin root directory (contains `db/services.php`)
    pub root: PathBuf,

    /// Frankenstyle component prefix of registry entries
    pub component: String,

    /// Leading namespace segment -> directory relative to `root`
    pub namespace_dirs: IndexMap<String, String>,

    /// Maximum nesting of delegated `Class::method()` calls
    pub max_delegation_depth: usize,

    /// Check `@subpackage` / `@copyright` headers of service files
    pub check_conventions: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let mut namespace_dirs = IndexMap::new();
        // not entirely true, but good enough for the plugin's autoloaded classes
        namespace_dirs.insert("local_lbplanner".to_string(), "classes".to_string());

        Self {
            root: PathBuf::from("lbplanner"),
            component: "local_lbplanner".to_string(),
            namespace_dirs,
            max_delegation_depth: 16,
            check_conventions: true,
        }
    }
}

impl ExtractorConfig {
    /// Load a config from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ApidocError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.component.is_empty() {
            return Err(ApidocError::invalid_config("component cannot be empty"));
        }

        if self.max_delegation_depth == 0 {
            return Err(ApidocError::invalid_config(
                "max_delegation_depth must be greater than 0",
            ));
        }

        if let Some((ns, _)) = self.namespace_dirs.iter().find(|(ns, _)| ns.contains('\\')) {
            return Err(ApidocError::invalid_config(format!(
                "namespace_dirs keys must be a single segment, got '{ns}'"
            )));
        }

        Ok(())
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    pub fn with_namespace_dir(
        mut self,
        namespace: impl Into<String>,
        dir: impl Into<String>,
    ) -> Self {
        self.namespace_dirs.insert(namespace.into(), dir.into());
        self
    }

    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    pub fn with_conventions(mut self, check: bool) -> Self {
        self.check_conventions = check;
        self
    }

    /// Directory bound to a leading namespace segment
    pub fn namespace_dir(&self, namespace: &str) -> Option<&str> {
        self.namespace_dirs.get(namespace).map(String::as_str)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join("db").join("services.php")
    }

    pub fn services_dir(&self) -> PathBuf {
        self.root.join("services")
    }
}
