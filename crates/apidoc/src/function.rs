use crate::ir::Schema;
use serde::Serialize;
use std::path::PathBuf;

/// A web service function as declared in the service registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    /// Function name without component or group, e.g. `get_all_slots`
    pub name: String,

    /// Service group, e.g. `slots`
    pub group: String,

    /// Required capabilities (empty = none required)
    pub capabilities: Vec<String>,

    pub description: String,

    /// Service file, relative to the plugin root
    pub path: PathBuf,
}

impl FunctionInfo {
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            capabilities: Vec::new(),
            description: String::new(),
            path: path.into(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Name used to tag diagnostics, e.g. `slots_get_all_slots`
    pub fn qualified_name(&self) -> String {
        format!("{}_{}", self.group, self.name)
    }
}

/// A registry function together with its compiled schemas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSchema {
    #[serde(flatten)]
    pub info: FunctionInfo,

    pub parameters: Schema,

    pub returns: Schema,
}

impl FunctionSchema {
    pub fn new(info: FunctionInfo, parameters: Schema, returns: Schema) -> Self {
        Self {
            info,
            parameters,
            returns,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }
}
