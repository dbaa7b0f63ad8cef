//! Verification issues and their merge rules.

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::constants::ANY_TOOL;
use crate::core::ResourceId;
use crate::resource::PACKAGE_KIND;

/// What an issue is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueSubject {
    Resource(ResourceId),
    Package(String),
    /// A filesystem entry with no resource identity.
    Path(PathBuf),
}

impl fmt::Display for IssueSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(id) => write!(f, "{id}"),
            Self::Package(name) => write!(f, "{PACKAGE_KIND}/{name}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Serialize for IssueSubject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Issue type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Link whose target does not exist
    Broken,
    /// Link pointing outside the store
    WrongRepo,
    /// Declared in the manifest but not installed anywhere
    NotInstalled,
    /// Declared package with members not installed
    PartialPackage,
    /// Installed from the store but not declared
    Orphaned,
    /// Link whose target cannot be read
    Unreadable,
    /// Regular file, directory or foreign link in a tool directory
    Unmanaged,
    /// Manifest reference to something missing from the store
    InvalidRef,
}

impl IssueKind {
    /// Default severity of this issue type.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Broken | Self::Unreadable | Self::InvalidRef => Severity::Error,
            Self::WrongRepo
            | Self::NotInstalled
            | Self::PartialPackage
            | Self::Orphaned
            | Self::Unmanaged => Severity::Warning,
        }
    }

    /// Tag as written in reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Broken => "broken",
            Self::WrongRepo => "wrong-repo",
            Self::NotInstalled => "not-installed",
            Self::PartialPackage => "partial-package",
            Self::Orphaned => "orphaned",
            Self::Unreadable => "unreadable",
            Self::Unmanaged => "unmanaged",
            Self::InvalidRef => "invalid-ref",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(rename = "resource")]
    pub subject: IssueSubject,
    /// Tool name, or `any` for manifest-level issues
    pub tool: String,
    #[serde(rename = "issue_type")]
    pub kind: IssueKind,
    pub description: String,
    pub path: PathBuf,
    pub severity: Severity,
}

impl Issue {
    /// Issue with the default severity of `kind`.
    pub fn new(
        subject: IssueSubject,
        tool: impl Into<String>,
        kind: IssueKind,
        description: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            subject,
            tool: tool.into(),
            kind,
            description: description.into(),
            path: path.into(),
            severity: kind.severity(),
        }
    }

    /// Manifest-level issue, not tied to a tool.
    pub fn manifest(
        subject: IssueSubject,
        kind: IssueKind,
        description: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::new(subject, ANY_TOOL, kind, description, path)
    }

    fn key(&self) -> (IssueSubject, String, IssueKind) {
        (self.subject.clone(), self.tool.clone(), self.kind)
    }
}

/// Merge link-scan and manifest issues.
///
/// Duplicates by `(subject, tool, kind)` are dropped, and so is a manifest
/// `not-installed` for a resource the link scan already reported.
pub fn merge_issues(scan: Vec<Issue>, manifest: Vec<Issue>) -> Vec<Issue> {
    let scanned: HashSet<IssueSubject> = scan.iter().map(|i| i.subject.clone()).collect();
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for issue in scan {
        if seen.insert(issue.key()) {
            merged.push(issue);
        }
    }

    for issue in manifest {
        if issue.kind == IssueKind::NotInstalled
            && matches!(issue.subject, IssueSubject::Resource(_))
            && scanned.contains(&issue.subject)
        {
            continue;
        }
        if seen.insert(issue.key()) {
            merged.push(issue);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResourceKind;

    fn skill(name: &str) -> IssueSubject {
        IssueSubject::Resource(ResourceId::new(ResourceKind::Skill, name))
    }

    #[test]
    fn test_severity_by_kind() {
        assert_eq!(IssueKind::Broken.severity(), Severity::Error);
        assert_eq!(IssueKind::WrongRepo.severity(), Severity::Warning);
        assert_eq!(IssueKind::PartialPackage.severity(), Severity::Warning);
    }

    #[test]
    fn test_merge_drops_duplicates_and_covered_not_installed() {
        let scan = vec![
            Issue::new(skill("pdf"), "claude", IssueKind::Broken, "broken", "/p/.claude/skills/pdf"),
            Issue::new(skill("pdf"), "claude", IssueKind::Broken, "broken", "/p/.claude/skills/pdf"),
        ];
        let manifest = vec![
            Issue::manifest(skill("pdf"), IssueKind::NotInstalled, "missing", "/p/ai.package.yaml"),
            Issue::manifest(skill("csv"), IssueKind::NotInstalled, "missing", "/p/ai.package.yaml"),
        ];

        let merged = merge_issues(scan, manifest);
        let summary: Vec<String> = merged.iter().map(|i| format!("{} {}", i.subject, i.kind)).collect();
        assert_eq!(summary, vec!["skill/pdf broken", "skill/csv not-installed"]);
    }

    #[test]
    fn test_serialized_shape() {
        let issue = Issue::manifest(
            IssueSubject::Package("web".to_string()),
            IssueKind::PartialPackage,
            "partial",
            "/p/ai.package.yaml",
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["resource"], "package/web");
        assert_eq!(json["tool"], "any");
        assert_eq!(json["issue_type"], "partial-package");
        assert_eq!(json["severity"], "warning");
    }
}
