//! Tenant entities: workspaces, users and workspace members.
//!
//! # Invariants
//! - A workspace only accepts new members while `Active`.
//! - `invite_hash` is unique across workspaces.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WorkspaceId = Uuid;
pub type UserId = Uuid;

/// Provisioning lifecycle of one workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceActivationStatus {
    PendingCreation,
    OngoingCreation,
    Active,
    Inactive,
}

impl WorkspaceActivationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingCreation => "PENDING_CREATION",
            Self::OngoingCreation => "ONGOING_CREATION",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING_CREATION" => Some(Self::PendingCreation),
            "ONGOING_CREATION" => Some(Self::OngoingCreation),
            "ACTIVE" => Some(Self::Active),
            "INACTIVE" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Tenant boundary; all records and users are scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub display_name: String,
    pub domain_name: String,
    pub invite_hash: String,
    pub activation_status: WorkspaceActivationStatus,
}

/// Authenticated account. Password hash never leaves the core crate in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub default_avatar_url: Option<String>,
    pub can_impersonate: bool,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub default_workspace_id: WorkspaceId,
}

/// First/last name pair used by person-like objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullName {
    pub first_name: String,
    pub last_name: String,
}

impl FullName {
    /// Display form, `"first last"` with missing parts dropped.
    pub fn display(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Date format as month first, day first, year first or system default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceMemberDateFormat {
    #[default]
    System,
    MonthFirst,
    DayFirst,
    YearFirst,
}

/// Time format as military, standard or system default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceMemberTimeFormat {
    #[default]
    System,
    Military,
    Standard,
}

/// A user's projection inside one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub id: Uuid,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub name: FullName,
    pub color_scheme: String,
    pub avatar_url: Option<String>,
    pub locale: String,
    pub time_zone: String,
    pub date_format: WorkspaceMemberDateFormat,
    pub time_format: WorkspaceMemberTimeFormat,
}

impl WorkspaceMember {
    /// Member with default preferences for a freshly joined user.
    pub fn for_user(user: &User, workspace_id: WorkspaceId) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            user_id: user.id,
            name: FullName {
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
            },
            color_scheme: "Light".to_string(),
            avatar_url: user.default_avatar_url.clone(),
            locale: "en".to_string(),
            time_zone: "system".to_string(),
            date_format: WorkspaceMemberDateFormat::System,
            time_format: WorkspaceMemberTimeFormat::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FullName, WorkspaceActivationStatus, WorkspaceMemberDateFormat};

    #[test]
    fn activation_status_parses_persisted_values() {
        for status in [
            WorkspaceActivationStatus::PendingCreation,
            WorkspaceActivationStatus::OngoingCreation,
            WorkspaceActivationStatus::Active,
            WorkspaceActivationStatus::Inactive,
        ] {
            assert_eq!(WorkspaceActivationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WorkspaceActivationStatus::parse("active"), None);
    }

    #[test]
    fn full_name_display_drops_missing_parts() {
        let name = FullName {
            first_name: "Ada".to_string(),
            last_name: String::new(),
        };
        assert_eq!(name.display(), "Ada");
    }

    #[test]
    fn date_format_uses_api_casing() {
        let json = serde_json::to_string(&WorkspaceMemberDateFormat::DayFirst).expect("serialize");
        assert_eq!(json, "\"DAY_FIRST\"");
    }
}
