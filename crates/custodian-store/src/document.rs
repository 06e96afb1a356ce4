//! Persisted document format
//!
//! [`AssetDocument`] is the wire/storage shape of an asset, deliberately
//! separate from [`Asset`]: every field is a plain string or option, and
//! loading validates the version, every enum and date, the assignment
//! invariant and history order before producing a [`StoredAsset`].

use crate::store::{Revision, StoredAsset};
use chrono::{DateTime, NaiveDate, Utc};
use custodian_model::{
    Asset, AssetDetails, AssetId, AssetStatus, AssetType, Assignee, AssignmentAction,
    AssignmentEvent, AssignmentHistory, TenantId, UserId,
};
use serde::{Deserialize, Serialize};

/// Current document schema version
pub const DOCUMENT_VERSION: u32 = 1;

/// Document load failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Schema version this build cannot read
    #[error("unsupported document version {0} (expected {DOCUMENT_VERSION})")]
    UnsupportedVersion(u32),

    /// Field value cannot be interpreted
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Fields individually valid but contradicting each other
    #[error("inconsistent document {id}: {reason}")]
    Inconsistent { id: String, reason: String },
}

impl DocumentError {
    fn field(field: &'static str, reason: impl ToString) -> Self {
        Self::InvalidField {
            field,
            reason: reason.to_string(),
        }
    }
}

/// Persisted assignment event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentEventDocument {
    pub action: String,
    pub user_name: String,
    /// RFC 3339
    pub timestamp: String,
}

/// Persisted asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDocument {
    pub version: u32,
    pub id: String,
    pub tenant: String,
    pub revision: u64,
    pub asset_tag: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub status: String,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub assigned_user_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub purchase_date: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub warranty_expiry: Option<String>,
    /// RFC 3339
    pub created_at: String,
    #[serde(default)]
    pub assignment_history: Vec<AssignmentEventDocument>,
}

/// Whole-store export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub assets: Vec<AssetDocument>,
}

impl Snapshot {
    /// Snapshot of the given records, sorted by id for stable output
    #[must_use]
    pub fn of(records: &[StoredAsset]) -> Self {
        let mut assets: Vec<AssetDocument> = records.iter().map(AssetDocument::from).collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            version: DOCUMENT_VERSION,
            assets,
        }
    }

    /// Validate and convert every document
    ///
    /// # Errors
    /// First [`DocumentError`] encountered.
    pub fn into_records(self) -> Result<Vec<StoredAsset>, DocumentError> {
        if self.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(self.version));
        }
        self.assets.into_iter().map(StoredAsset::try_from).collect()
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_date(field: &'static str, raw: Option<String>) -> Result<Option<NaiveDate>, DocumentError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| DocumentError::field(field, e)))
        .transpose()
}

fn parse_instant(field: &'static str, raw: &str) -> Result<DateTime<Utc>, DocumentError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DocumentError::field(field, e))
}

fn parse_action(raw: &str) -> Result<AssignmentAction, DocumentError> {
    match raw {
        "assigned" => Ok(AssignmentAction::Assigned),
        "unassigned" => Ok(AssignmentAction::Unassigned),
        other => Err(DocumentError::field("assignmentHistory.action", other)),
    }
}

impl From<&StoredAsset> for AssetDocument {
    fn from(stored: &StoredAsset) -> Self {
        let asset = &stored.asset;
        let details = &asset.details;
        Self {
            version: DOCUMENT_VERSION,
            id: asset.id.to_string(),
            tenant: asset.tenant.as_str().to_string(),
            revision: stored.revision.0,
            asset_tag: asset.asset_tag.clone(),
            asset_type: asset.asset_type.as_str().to_string(),
            status: asset.status.as_str().to_string(),
            assigned_user_id: asset.assigned_user_id().map(|u| u.as_str().to_string()),
            assigned_user_name: asset.assigned_user_name().map(str::to_string),
            name: details.name.clone(),
            serial_number: details.serial_number.clone(),
            category_id: details.category_id.clone(),
            category_name: details.category_name.clone(),
            department_id: details.department_id.clone(),
            department_name: details.department_name.clone(),
            location_id: details.location_id.clone(),
            location_name: details.location_name.clone(),
            purchase_date: format_date(details.purchase_date),
            warranty_expiry: format_date(details.warranty_expiry),
            created_at: asset.created_at.to_rfc3339(),
            assignment_history: asset
                .assignment_history
                .entries()
                .iter()
                .map(|e| AssignmentEventDocument {
                    action: e.action.as_str().to_string(),
                    user_name: e.user_name.clone(),
                    timestamp: e.timestamp.to_rfc3339(),
                })
                .collect(),
        }
    }
}

impl TryFrom<AssetDocument> for StoredAsset {
    type Error = DocumentError;

    fn try_from(doc: AssetDocument) -> Result<Self, Self::Error> {
        if doc.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(doc.version));
        }

        let id: AssetId = doc.id.parse().map_err(|e| DocumentError::field("id", e))?;
        if doc.tenant.trim().is_empty() {
            return Err(DocumentError::field("tenant", "empty"));
        }
        if doc.asset_tag.trim().is_empty() {
            return Err(DocumentError::field("assetTag", "empty"));
        }
        if doc.revision == 0 {
            return Err(DocumentError::field("revision", "must be at least 1"));
        }
        let asset_type: AssetType = doc
            .asset_type
            .parse()
            .map_err(|_| DocumentError::field("type", &doc.asset_type))?;
        let status: AssetStatus = doc
            .status
            .parse()
            .map_err(|_| DocumentError::field("status", &doc.status))?;

        let assignee = match (doc.assigned_user_id, doc.assigned_user_name) {
            (Some(user_id), Some(user_name)) => Some(Assignee::new(UserId::new(user_id), user_name)),
            (None, None) => None,
            _ => {
                return Err(DocumentError::Inconsistent {
                    id: doc.id,
                    reason: "assignee id and name must be present together".into(),
                })
            }
        };

        let events = doc
            .assignment_history
            .into_iter()
            .map(|e| {
                Ok(AssignmentEvent::new(
                    parse_action(&e.action)?,
                    e.user_name,
                    parse_instant("assignmentHistory.timestamp", &e.timestamp)?,
                ))
            })
            .collect::<Result<Vec<_>, DocumentError>>()?;
        let assignment_history =
            AssignmentHistory::from_events(events).map_err(|e| DocumentError::Inconsistent {
                id: doc.id.clone(),
                reason: e.to_string(),
            })?;

        let asset = Asset {
            id,
            tenant: TenantId::new(doc.tenant),
            asset_tag: doc.asset_tag,
            asset_type,
            status,
            assignee,
            details: AssetDetails {
                name: doc.name,
                serial_number: doc.serial_number,
                category_id: doc.category_id,
                category_name: doc.category_name,
                department_id: doc.department_id,
                department_name: doc.department_name,
                location_id: doc.location_id,
                location_name: doc.location_name,
                purchase_date: parse_date("purchaseDate", doc.purchase_date)?,
                warranty_expiry: parse_date("warrantyExpiry", doc.warranty_expiry)?,
            },
            created_at: parse_instant("createdAt", &doc.created_at)?,
            assignment_history,
        };

        if !asset.assignment_consistent() {
            return Err(DocumentError::Inconsistent {
                id: doc.id,
                reason: format!("status {} disagrees with assignee", asset.status),
            });
        }

        Ok(StoredAsset {
            asset,
            revision: Revision(doc.revision),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assigned_record() -> StoredAsset {
        let mut history = AssignmentHistory::new();
        history
            .append(AssignmentEvent::new(
                AssignmentAction::Assigned,
                "Ansh",
                Utc::now(),
            ))
            .unwrap();
        StoredAsset {
            asset: Asset {
                id: AssetId::new(),
                tenant: TenantId::new("acme"),
                asset_tag: "DESK-042".into(),
                asset_type: AssetType::Hardware,
                status: AssetStatus::Assigned,
                assignee: Some(Assignee::new(UserId::new("u-ansh"), "Ansh")),
                details: AssetDetails {
                    category_name: Some("Furniture".into()),
                    purchase_date: NaiveDate::from_ymd_opt(2024, 2, 10),
                    ..AssetDetails::named("Standing Desk Pro")
                },
                created_at: Utc::now(),
                assignment_history: history,
            },
            revision: Revision(4),
        }
    }

    #[test]
    fn document_preserves_record() {
        let record = assigned_record();
        let doc = AssetDocument::from(&record);
        assert_eq!(doc.status, "assigned");
        assert_eq!(doc.purchase_date.as_deref(), Some("2024-02-10"));
        assert_eq!(StoredAsset::try_from(doc).unwrap(), record);
    }

    #[test]
    fn document_json_is_camel_case() {
        let json = serde_json::to_value(AssetDocument::from(&assigned_record())).unwrap();
        assert_eq!(json["assetTag"], "DESK-042");
        assert_eq!(json["assignedUserName"], "Ansh");
        assert_eq!(json["type"], "hardware");
        assert_eq!(json["assignmentHistory"][0]["userName"], "Ansh");
    }

    #[test]
    fn rejects_future_versions() {
        let mut doc = AssetDocument::from(&assigned_record());
        doc.version = 2;
        assert_eq!(
            StoredAsset::try_from(doc),
            Err(DocumentError::UnsupportedVersion(2))
        );
    }

    #[test]
    fn rejects_assignee_without_assigned_status() {
        let mut doc = AssetDocument::from(&assigned_record());
        doc.status = "available".into();
        assert!(matches!(
            StoredAsset::try_from(doc),
            Err(DocumentError::Inconsistent { .. })
        ));
    }

    #[test]
    fn rejects_half_assignee() {
        let mut doc = AssetDocument::from(&assigned_record());
        doc.assigned_user_id = None;
        assert!(matches!(
            StoredAsset::try_from(doc),
            Err(DocumentError::Inconsistent { .. })
        ));
    }

    #[test]
    fn rejects_unknown_enums_and_dates() {
        let mut doc = AssetDocument::from(&assigned_record());
        doc.status = "lost".into();
        assert!(matches!(
            StoredAsset::try_from(doc),
            Err(DocumentError::InvalidField { field: "status", .. })
        ));

        let mut doc = AssetDocument::from(&assigned_record());
        doc.warranty_expiry = Some("next year".into());
        assert!(matches!(
            StoredAsset::try_from(doc),
            Err(DocumentError::InvalidField { field: "warrantyExpiry", .. })
        ));
    }

    #[test]
    fn snapshot_checks_version() {
        let snapshot = Snapshot {
            version: 9,
            assets: Vec::new(),
        };
        assert_eq!(
            snapshot.into_records(),
            Err(DocumentError::UnsupportedVersion(9))
        );
    }
}
