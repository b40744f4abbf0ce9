//! Identifiers and closed enumerations shared across the crate.
//!
//! Every string-keyed switch of the dashboard (categories, activity kinds,
//! scan states, roles) is a closed enum here with a single mapping table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw numeric value.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

id_type!(
    /// Identifier of a document row.
    DocumentId
);
id_type!(
    /// Identifier of a dashboard user.
    UserId
);
id_type!(
    /// Identifier of a project.
    ProjectId
);
id_type!(
    /// Identifier of a task within a project.
    TaskId
);
id_type!(
    /// Identifier of an audit activity row.
    ActivityId
);

/// Document category. The set is closed; policy may narrow which of these
/// are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// "Project Documents"
    #[serde(rename = "Project Documents")]
    ProjectDocuments,
    /// "Team Resources"
    #[serde(rename = "Team Resources")]
    TeamResources,
    /// "Personal Files"
    #[serde(rename = "Personal Files")]
    PersonalFiles,
    /// "Reports"
    Reports,
    /// "Presentations"
    Presentations,
    /// "Other"
    Other,
}

const CATEGORY_LABELS: [(Category, &str); 6] = [
    (Category::ProjectDocuments, "Project Documents"),
    (Category::TeamResources, "Team Resources"),
    (Category::PersonalFiles, "Personal Files"),
    (Category::Reports, "Reports"),
    (Category::Presentations, "Presentations"),
    (Category::Other, "Other"),
];

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 6] = [
        Category::ProjectDocuments,
        Category::TeamResources,
        Category::PersonalFiles,
        Category::Reports,
        Category::Presentations,
        Category::Other,
    ];

    /// Returns the user-facing label.
    pub fn label(self) -> &'static str {
        CATEGORY_LABELS
            .iter()
            .find(|(c, _)| *c == self)
            .map(|(_, l)| *l)
            .unwrap_or("Other")
    }

    /// Looks up a category by its exact label.
    pub fn from_label(label: &str) -> Option<Self> {
        CATEGORY_LABELS
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(c, _)| *c)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Malware scan state of a document's current content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Waiting for the scanning worker.
    #[default]
    Pending,
    /// Scanned and releasable.
    Clean,
    /// Scanned and withheld.
    Rejected,
}

impl ScanStatus {
    /// Returns `true` if content may be released.
    pub fn is_clean(self) -> bool {
        matches!(self, Self::Clean)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Clean => write!(f, "clean"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Kind of an audit activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// New document stored.
    Upload,
    /// Content fetched as attachment.
    Download,
    /// Content fetched inline.
    Preview,
    /// Title, description, category or tags changed.
    MetadataEdit,
    /// Content swapped for a new file.
    Replace,
    /// Soft-deleted.
    Delete,
    /// Read access granted to another user.
    Share,
}

impl ActivityKind {
    /// Stable snake_case name used in audit output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Preview => "preview",
            Self::MetadataEdit => "metadata_edit",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Share => "share",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Regular team member.
    #[default]
    Employee,
    /// Leads one or more teams.
    TeamLead,
    /// Manages projects.
    ProjectManager,
    /// Full access to every document.
    Administrator,
}

impl Role {
    /// Returns `true` for the administrator role.
    pub fn is_administrator(self) -> bool {
        matches!(self, Self::Administrator)
    }
}

/// Kind of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Something changed in a project the user belongs to.
    ProjectUpdate,
    /// System-level message.
    SystemAnnouncement,
}

/// Priority of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationPriority {
    /// No action expected.
    Informational,
    /// Worth reading soon.
    Important,
    /// Needs attention now.
    Urgent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_roundtrip_through_table() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!("Reports".parse::<Category>().unwrap(), Category::Reports);
        assert!("reports".parse::<Category>().is_err());
        assert!("Invoices".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_uses_labels() {
        let json = serde_json::to_string(&Category::TeamResources).unwrap();
        assert_eq!(json, "\"Team Resources\"");
        let back: Category = serde_json::from_str("\"Personal Files\"").unwrap();
        assert_eq!(back, Category::PersonalFiles);
    }

    #[test]
    fn test_scan_status_default_is_pending() {
        assert_eq!(ScanStatus::default(), ScanStatus::Pending);
        assert!(ScanStatus::Clean.is_clean());
        assert!(!ScanStatus::Rejected.is_clean());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(DocumentId(42).to_string(), "42");
        assert_eq!(UserId::from(7).get(), 7);
    }
}
