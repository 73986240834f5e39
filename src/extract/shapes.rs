//! Upstream payload shapes, as loosely as Renovate emits them.
//!
//! Every field is optional. Entries that fail to deserialize are skipped by
//! the callers rather than failing the whole payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One package file inside a `packageFilesWithUpdates` config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageFileWithUpdates {
    pub manager: Option<String>,
    pub package_file: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub deps: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatedDep {
    pub package_name: Option<String>,
    pub dep_name: Option<String>,
    pub current_version: Option<String>,
    pub current_value: Option<String>,
    pub datasource: Option<String>,
    pub dep_type: Option<String>,
    #[serde(flatten)]
    pub registry: RegistryHints,
    #[serde(deserialize_with = "null_as_default")]
    pub updates: Vec<Update>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Update {
    pub new_version: Option<String>,
    pub new_value: Option<String>,
    pub update_type: Option<String>,
}

/// Where a dependency's registry lives, under whichever name upstream used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryHints {
    pub registry_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub registry_urls: Vec<String>,
    pub source_url: Option<String>,
}

impl RegistryHints {
    pub fn base(&self) -> Option<&str> {
        non_empty(self.registry_url.as_deref())
            .or_else(|| self.registry_urls.iter().map(String::as_str).find(|u| !u.is_empty()))
            .or_else(|| non_empty(self.source_url.as_deref()))
    }
}

/// One entry of a plain `packageFiles` payload; deps are keyed by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlainPackageFile {
    pub manager: Option<String>,
    pub package_file: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub deps: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlainDep {
    pub current_version: Option<String>,
    pub current_value: Option<String>,
    pub dep_type: Option<String>,
    pub datasource: Option<String>,
    #[serde(flatten)]
    pub registry: RegistryHints,
    #[serde(deserialize_with = "null_as_default")]
    pub updates: Vec<Update>,
}

/// One branch from the extended branches summary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BranchInfo {
    pub branch_name: Option<String>,
    pub pr_no: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub upgrades: Vec<Value>,
}

impl BranchInfo {
    /// A zero, empty or `false` PR number means no pull request yet.
    pub fn has_pull_request(&self) -> bool {
        match &self.pr_no {
            None | Some(Value::Null) => false,
            Some(Value::Number(n)) => n.as_f64() != Some(0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(_) => true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BranchUpgrade {
    pub dep_name: Option<String>,
    pub package_name: Option<String>,
    pub current_version: Option<String>,
    pub current_value: Option<String>,
    pub new_version: Option<String>,
    pub new_value: Option<String>,
    pub datasource: Option<String>,
    pub manager: Option<String>,
    pub dep_type: Option<String>,
    pub update_type: Option<String>,
    #[serde(flatten)]
    pub registry: RegistryHints,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses each element of a JSON array, dropping the ones that don't fit.
pub fn parse_each<T: DeserializeOwned>(items: &[Value]) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// First non-empty candidate, or `fallback`.
pub fn first_or(candidates: &[Option<&String>], fallback: &str) -> String {
    candidates
        .iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| fallback.to_string())
}
