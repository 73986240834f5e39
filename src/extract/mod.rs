//! Dependency extraction from streamed Renovate log messages.
//!
//! Upstream reports updates in several incompatible shapes. Each one is a
//! variant of [`UpdatePayload`]; every variant normalizes into the same
//! [`Dependency`] row, and all rows go through one merge point,
//! [`DependencyTable::upsert`].
//!
//! Detection order is fixed:
//! 1. `packageFilesWithUpdates` with a `config` object
//! 2. `packageFiles` with a `packageFiles` array
//! 3. `branchesInformation` (by tag, or by message text) with a
//!    `branchesInformation` array
//! 4. the text pattern `Upgrading dependency <name> from <cur> to <new>`

pub mod registry;
pub mod shapes;
pub mod table;

pub use registry::package_url;
pub use table::{DependencyTable, Upsert};

use serde_json::Value;

use crate::model::{Dependency, DependencyStatus, LogMessage};
use shapes::{
    first_or, parse_each, BranchInfo, BranchUpgrade, PackageFileWithUpdates, PlainDep,
    PlainPackageFile, UpdatedDep,
};

pub const TAG_PACKAGE_FILES_WITH_UPDATES: &str = "packageFilesWithUpdates";
pub const TAG_PACKAGE_FILES: &str = "packageFiles";
pub const TAG_BRANCHES_INFORMATION: &str = "branchesInformation";

/// Message text Renovate logs alongside the extended branch summary.
const BRANCHES_INFO_TEXT: &str = "branches info extended";

const UNKNOWN: &str = "unknown";

/// A recognized update report, one variant per upstream shape.
#[derive(Debug, Clone)]
pub enum UpdatePayload {
    /// Manager name → package files with per-dependency update lists
    Combined(Vec<(String, Vec<PackageFileWithUpdates>)>),
    /// Package files whose deps are keyed by dependency name
    PackageFiles(Vec<PlainPackageFile>),
    /// Branch summaries with their upgrades
    BranchInfo(Vec<BranchInfo>),
    /// Parsed from a human-readable log line
    Text(TextUpgrade),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUpgrade {
    pub name: String,
    pub current_version: String,
    pub new_version: String,
}

impl UpdatePayload {
    /// Picks the first matching shape. `display_text` is the cleaned message
    /// used by the text fallback.
    pub fn detect(message: &LogMessage, display_text: &str) -> Option<Self> {
        let tag = message.tag();

        if tag == Some(TAG_PACKAGE_FILES_WITH_UPDATES) {
            if let Some(Value::Object(config)) = &message.config {
                let managers = config
                    .iter()
                    .filter_map(|(manager, files)| match files {
                        Value::Array(files) => Some((manager.clone(), parse_each(files))),
                        _ => None,
                    })
                    .collect();
                return Some(UpdatePayload::Combined(managers));
            }
        }

        if tag == Some(TAG_PACKAGE_FILES) {
            if let Some(Value::Array(files)) = &message.package_files {
                return Some(UpdatePayload::PackageFiles(parse_each(files)));
            }
        }

        // Upstream is not consistent about tagging this event, so the text is
        // checked as well.
        let branch_event = tag == Some(TAG_BRANCHES_INFORMATION)
            || message.text().to_lowercase().contains(BRANCHES_INFO_TEXT);
        if branch_event {
            if let Some(Value::Array(branches)) = &message.branches_information {
                return Some(UpdatePayload::BranchInfo(parse_each(branches)));
            }
        }

        parse_upgrade_text(display_text).map(UpdatePayload::Text)
    }

    /// Normalizes the payload into dependency rows.
    pub fn into_dependencies(self, default_datasource: &str) -> Vec<Dependency> {
        match self {
            UpdatePayload::Combined(managers) => combined_dependencies(managers),
            UpdatePayload::PackageFiles(files) => package_file_dependencies(files, default_datasource),
            UpdatePayload::BranchInfo(branches) => branch_dependencies(branches, default_datasource),
            UpdatePayload::Text(upgrade) => vec![Dependency {
                datasource: default_datasource.to_string(),
                name: upgrade.name,
                current_version: upgrade.current_version,
                new_version: upgrade.new_version,
                manager: None,
                dep_type: None,
                status: None,
                registry_url: None,
            }],
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            UpdatePayload::Combined(_) => "combined",
            UpdatePayload::PackageFiles(_) => "package-files",
            UpdatePayload::BranchInfo(_) => "branch-info",
            UpdatePayload::Text(_) => "text",
        }
    }
}

/// One row per (manager, package file, dependency, update).
fn combined_dependencies(managers: Vec<(String, Vec<PackageFileWithUpdates>)>) -> Vec<Dependency> {
    let mut out = Vec::new();
    for (manager_key, files) in managers {
        for file in files {
            let deps: Vec<UpdatedDep> = parse_each(&file.deps);
            for dep in deps {
                let name = first_or(&[dep.package_name.as_ref(), dep.dep_name.as_ref()], UNKNOWN);
                let datasource = first_or(&[dep.datasource.as_ref()], &manager_key);
                let registry_url = package_url(dep.registry.base(), &name, &datasource);
                let current_version =
                    first_or(&[dep.current_version.as_ref(), dep.current_value.as_ref()], UNKNOWN);
                let manager = first_or(&[file.manager.as_ref()], &manager_key);

                for update in &dep.updates {
                    out.push(Dependency {
                        datasource: datasource.clone(),
                        name: name.clone(),
                        current_version: current_version.clone(),
                        new_version: first_or(
                            &[update.new_version.as_ref(), update.new_value.as_ref()],
                            UNKNOWN,
                        ),
                        manager: Some(manager.clone()),
                        dep_type: dep.dep_type.clone().or_else(|| update.update_type.clone()),
                        status: Some(DependencyStatus::Discovered),
                        registry_url: registry_url.clone(),
                    });
                }
            }
        }
    }
    out
}

/// One row per dependency, from its last listed update.
fn package_file_dependencies(files: Vec<PlainPackageFile>, default_datasource: &str) -> Vec<Dependency> {
    let mut out = Vec::new();
    for file in files {
        for (name, detail) in &file.deps {
            let Ok(dep) = serde_json::from_value::<PlainDep>(detail.clone()) else {
                continue;
            };
            let Some(update) = dep.updates.last() else {
                continue;
            };

            let datasource = first_or(
                &[dep.datasource.as_ref(), file.manager.as_ref()],
                default_datasource,
            );
            out.push(Dependency {
                registry_url: package_url(dep.registry.base(), name, &datasource),
                datasource,
                name: name.clone(),
                current_version: first_or(
                    &[dep.current_version.as_ref(), dep.current_value.as_ref()],
                    UNKNOWN,
                ),
                new_version: first_or(&[update.new_version.as_ref(), update.new_value.as_ref()], UNKNOWN),
                manager: file.manager.clone(),
                dep_type: dep.dep_type.clone(),
                status: None,
            });
        }
    }
    out
}

/// One row per upgrade; status follows the owning branch's pull request.
fn branch_dependencies(branches: Vec<BranchInfo>, default_datasource: &str) -> Vec<Dependency> {
    let mut out = Vec::new();
    for branch in branches {
        let status = if branch.has_pull_request() {
            DependencyStatus::UpdateAvailable
        } else {
            DependencyStatus::Discovered
        };

        let upgrades: Vec<BranchUpgrade> = parse_each(&branch.upgrades);
        for upgrade in upgrades {
            let name = first_or(&[upgrade.dep_name.as_ref(), upgrade.package_name.as_ref()], UNKNOWN);
            let datasource = first_or(&[upgrade.datasource.as_ref()], default_datasource);
            out.push(Dependency {
                registry_url: package_url(upgrade.registry.base(), &name, &datasource),
                datasource,
                current_version: first_or(
                    &[upgrade.current_version.as_ref(), upgrade.current_value.as_ref()],
                    UNKNOWN,
                ),
                new_version: first_or(
                    &[upgrade.new_version.as_ref(), upgrade.new_value.as_ref()],
                    UNKNOWN,
                ),
                name,
                manager: upgrade.manager,
                dep_type: upgrade.dep_type.or(upgrade.update_type),
                status: Some(status),
            });
        }
    }
    out
}

/// Finds `Upgrading dependency <name> from <cur> to <new>` anywhere in `text`.
/// Tokens may be separated by any run of whitespace.
pub fn parse_upgrade_text(text: &str) -> Option<TextUpgrade> {
    const MARKER: &str = "Upgrading dependency";

    let mut search = text;
    while let Some(pos) = search.find(MARKER) {
        let rest = &search[pos + MARKER.len()..];
        if rest.starts_with(char::is_whitespace) {
            let mut words = rest.split_whitespace();
            if let (Some(name), Some("from"), Some(current), Some("to"), Some(new)) =
                (words.next(), words.next(), words.next(), words.next(), words.next())
            {
                return Some(TextUpgrade {
                    name: name.to_string(),
                    current_version: current.to_string(),
                    new_version: new.to_string(),
                });
            }
        }
        search = rest;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: Value) -> LogMessage {
        serde_json::from_value(value).unwrap()
    }

    fn extract(value: Value) -> Vec<Dependency> {
        let msg = message(value);
        let text = crate::present::clean_message(msg.text());
        UpdatePayload::detect(&msg, &text)
            .map(|p| p.into_dependencies("npm"))
            .unwrap_or_default()
    }

    #[test]
    fn test_combined_single_record() {
        let deps = extract(json!({
            "type": "packageFilesWithUpdates",
            "config": {"npm": [{"manager": "npm", "deps": [{
                "packageName": "lodash",
                "currentVersion": "4.17.20",
                "registryUrl": "https://registry.npmjs.org",
                "updates": [{"newVersion": "4.17.21"}]
            }]}]}
        }));

        assert_eq!(deps.len(), 1);
        let d = &deps[0];
        assert_eq!(d.name, "lodash");
        assert_eq!(d.current_version, "4.17.20");
        assert_eq!(d.new_version, "4.17.21");
        assert_eq!(d.manager.as_deref(), Some("npm"));
        assert_eq!(d.datasource, "npm");
        assert_eq!(d.status, Some(DependencyStatus::Discovered));
        assert_eq!(d.registry_url.as_deref(), Some("https://registry.npmjs.org/lodash"));
    }

    #[test]
    fn test_combined_without_base_has_no_registry_url() {
        let deps = extract(json!({
            "type": "packageFilesWithUpdates",
            "config": {"npm": [{"manager": "npm", "deps": [{
                "packageName": "lodash",
                "currentVersion": "4.17.20",
                "updates": [{"newVersion": "4.17.21"}]
            }]}]}
        }));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].registry_url, None);
    }

    #[test]
    fn test_combined_cartesian_expansion_and_fallbacks() {
        let deps = extract(json!({
            "type": "packageFilesWithUpdates",
            "config": {
                "regex": [{"deps": [{
                    "depName": "node",
                    "currentValue": "18.0.0",
                    "datasource": "node-version",
                    "sourceUrl": "https://nodejs.org/dist",
                    "updates": [
                        {"newValue": "18.19.0", "updateType": "minor"},
                        {"newVersion": "20.11.0", "updateType": "major"}
                    ]
                }, {
                    "updates": [{}]
                }, {
                    "depName": "no-updates",
                    "updates": []
                }]}],
                "ignored": "not a list"
            }
        }));

        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].name, "node");
        assert_eq!(deps[0].datasource, "node-version");
        assert_eq!(deps[0].manager.as_deref(), Some("regex"));
        assert_eq!(deps[0].current_version, "18.0.0");
        assert_eq!(deps[0].new_version, "18.19.0");
        assert_eq!(deps[0].dep_type.as_deref(), Some("minor"));
        assert_eq!(deps[0].registry_url.as_deref(), Some("https://nodejs.org/dist"));
        assert_eq!(deps[1].new_version, "20.11.0");

        assert_eq!(deps[2].name, "unknown");
        assert_eq!(deps[2].current_version, "unknown");
        assert_eq!(deps[2].new_version, "unknown");
        assert_eq!(deps[2].datasource, "regex");
    }

    #[test]
    fn test_package_files_uses_last_update() {
        let deps = extract(json!({
            "type": "packageFiles",
            "packageFiles": [{
                "packageFile": "package.json",
                "manager": "npm",
                "deps": {
                    "react": {
                        "currentVersion": "17.0.2",
                        "depType": "dependencies",
                        "updates": [{"newVersion": "17.0.3"}, {"newVersion": "18.2.0"}]
                    },
                    "untouched": {"currentVersion": "1.0.0", "updates": []}
                }
            }]
        }));

        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "react");
        assert_eq!(deps[0].new_version, "18.2.0");
        assert_eq!(deps[0].dep_type.as_deref(), Some("dependencies"));
        assert_eq!(deps[0].manager.as_deref(), Some("npm"));
        assert_eq!(deps[0].status, None);
    }

    #[test]
    fn test_branch_status_follows_pull_request() {
        let discovered = extract(json!({
            "type": "branchesInformation",
            "branchesInformation": [{"prNo": null, "upgrades": [{"depName": "foo", "newVersion": "2.0.0"}]}]
        }));
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].name, "foo");
        assert_eq!(discovered[0].current_version, "unknown");
        assert_eq!(discovered[0].status, Some(DependencyStatus::Discovered));

        let open = extract(json!({
            "type": "branchesInformation",
            "branchesInformation": [{"prNo": 42, "upgrades": [{"depName": "foo", "newVersion": "2.0.0"}]}]
        }));
        assert_eq!(open[0].status, Some(DependencyStatus::UpdateAvailable));
    }

    #[test]
    fn test_branch_detected_by_text() {
        let deps = extract(json!({
            "msg": "Branches info extended",
            "branchesInformation": [{"upgrades": [{"packageName": "bar", "currentValue": "1.0.0", "newValue": "1.1.0"}]}]
        }));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "bar");
        assert_eq!(deps[0].current_version, "1.0.0");
        assert_eq!(deps[0].new_version, "1.1.0");
    }

    #[test]
    fn test_text_fallback() {
        let deps = extract(json!({"msg": "Upgrading dependency express from 4.18.0 to 4.18.2"}));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "express");
        assert_eq!(deps[0].current_version, "4.18.0");
        assert_eq!(deps[0].new_version, "4.18.2");
        assert_eq!(deps[0].datasource, "npm");
        assert_eq!(deps[0].status, None);
    }

    #[test]
    fn test_text_fallback_after_prefix_cleanup() {
        let deps = extract(json!({
            "msg": "2024-01-01T00:00:00.000Z INFO: Upgrading dependency chalk from 4.1.2 to 5.3.0"
        }));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "chalk");
    }

    #[test]
    fn test_structured_tag_wins_over_text() {
        let deps = extract(json!({
            "type": "packageFiles",
            "msg": "Upgrading dependency express from 4.18.0 to 4.18.2",
            "packageFiles": []
        }));
        assert!(deps.is_empty());
    }

    #[test]
    fn test_tag_without_payload_falls_through() {
        let deps = extract(json!({
            "type": "packageFilesWithUpdates",
            "msg": "Upgrading dependency express from 4.18.0 to 4.18.2"
        }));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "express");
    }

    #[test]
    fn test_combined_tolerates_null_lists() {
        let deps = extract(json!({
            "type": "packageFilesWithUpdates",
            "config": {"npm": [{"manager": "npm", "deps": [{
                "packageName": "lodash",
                "currentVersion": "4.17.20",
                "registryUrls": null,
                "registryUrl": "https://registry.npmjs.org",
                "updates": [{"newVersion": "4.17.21"}]
            }]}]}
        }));
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "lodash");
        assert_eq!(deps[0].registry_url.as_deref(), Some("https://registry.npmjs.org/lodash"));
    }

    #[test]
    fn test_branch_with_zero_pr_is_discovered() {
        let deps = extract(json!({
            "type": "branchesInformation",
            "branchesInformation": [{"prNo": 0, "upgrades": [{"depName": "foo", "newVersion": "2.0.0"}]}]
        }));
        assert_eq!(deps[0].status, Some(DependencyStatus::Discovered));
    }

    #[test]
    fn test_parse_upgrade_text_any_whitespace() {
        let expected = Some(TextUpgrade {
            name: "express".to_string(),
            current_version: "4.18.0".to_string(),
            new_version: "4.18.2".to_string(),
        });
        assert_eq!(parse_upgrade_text("Upgrading dependency  express from 4.18.0 to 4.18.2"), expected);
        assert_eq!(parse_upgrade_text("Upgrading dependency\texpress  from 4.18.0\tto 4.18.2"), expected);
        assert_eq!(parse_upgrade_text("Upgrading dependencyexpress from 4.18.0 to 4.18.2"), None);
    }

    #[test]
    fn test_parse_upgrade_text_rejects_partial() {
        assert_eq!(parse_upgrade_text("Upgrading dependency express"), None);
        assert_eq!(parse_upgrade_text("Upgrading dependency express to 4.18.2"), None);
        assert_eq!(parse_upgrade_text("nothing here"), None);
    }
}
