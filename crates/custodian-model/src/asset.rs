//! Asset records
//!
//! An [`Asset`] is the unit of inventory. Its `status` and assignee are only
//! ever changed by the lifecycle engine, and its [`AssignmentHistory`] only
//! grows.

use crate::error::InventoryError;
use crate::ids::{AssetId, TenantId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Physical equipment
    #[default]
    Hardware,
    /// Licenses and installations
    Software,
    /// Anything else
    Other,
}

impl AssetType {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hardware => "hardware",
            Self::Software => "software",
            Self::Other => "other",
        }
    }
}

impl FromStr for AssetType {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hardware" => Ok(Self::Hardware),
            "software" => Ok(Self::Software),
            "other" => Ok(Self::Other),
            other => Err(InventoryError::InvalidDraft(format!(
                "unknown asset type: {other}"
            ))),
        }
    }
}

/// Lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Ready to be assigned
    Available,
    /// Held by a person
    Assigned,
    /// Out for repair
    InRepair,
    /// Taken out of service, may be reactivated
    Retired,
    /// Gone for good
    Disposed,
}

impl AssetStatus {
    /// Every status, in declaration order
    pub const ALL: [AssetStatus; 5] = [
        Self::Available,
        Self::Assigned,
        Self::InRepair,
        Self::Retired,
        Self::Disposed,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::InRepair => "in_repair",
            Self::Retired => "retired",
            Self::Disposed => "disposed",
        }
    }

    /// Whether no transition leaves this status
    #[inline]
    #[must_use]
    pub const fn is_absorbing(self) -> bool {
        matches!(self, Self::Disposed)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetStatus {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InventoryError::InvalidDraft(format!("unknown status: {s}")))
    }
}

/// Current holder of an assigned asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    /// Holder id
    pub user_id: UserId,
    /// Holder display name
    pub user_name: String,
}

impl Assignee {
    /// Create an assignee
    #[must_use]
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

/// Assignment audit action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentAction {
    /// Asset handed to a person
    Assigned,
    /// Asset taken back
    Unassigned,
}

impl AssignmentAction {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
        }
    }
}

/// One audit entry of the assignment history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentEvent {
    /// What happened
    pub action: AssignmentAction,
    /// The person involved
    pub user_name: String,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl AssignmentEvent {
    /// Create an event
    #[must_use]
    pub fn new(action: AssignmentAction, user_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            action,
            user_name: user_name.into(),
            timestamp,
        }
    }
}

/// Assignment history violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// Entry would be older than the last recorded one
    #[error("entry at {attempted} precedes last entry at {last}")]
    OutOfOrder {
        /// Timestamp of the current last entry
        last: DateTime<Utc>,
        /// Timestamp of the rejected entry
        attempted: DateTime<Utc>,
    },
}

/// Append-only, timestamp-ordered sequence of assignment events
///
/// There is no way to edit or remove an entry once it is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AssignmentEvent>", into = "Vec<AssignmentEvent>")]
pub struct AssignmentHistory(Vec<AssignmentEvent>);

impl AssignmentHistory {
    /// Empty history
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Rebuild a history, checking ordering
    ///
    /// # Errors
    /// Returns [`HistoryError::OutOfOrder`] if timestamps decrease.
    pub fn from_events(events: Vec<AssignmentEvent>) -> Result<Self, HistoryError> {
        let mut history = Self::new();
        for event in events {
            history.append(event)?;
        }
        Ok(history)
    }

    /// Append an entry at the end
    ///
    /// # Errors
    /// Returns [`HistoryError::OutOfOrder`] if the entry is older than the
    /// last one.
    pub fn append(&mut self, event: AssignmentEvent) -> Result<(), HistoryError> {
        if let Some(last) = self.0.last() {
            if event.timestamp < last.timestamp {
                return Err(HistoryError::OutOfOrder {
                    last: last.timestamp,
                    attempted: event.timestamp,
                });
            }
        }
        self.0.push(event);
        Ok(())
    }

    /// Entries, oldest first
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[AssignmentEvent] {
        &self.0
    }

    /// Most recent entry
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&AssignmentEvent> {
        self.0.last()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was ever recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `other` keeps every entry of `self` unchanged, in place
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0[..] == other.0[..self.0.len()]
    }
}

impl TryFrom<Vec<AssignmentEvent>> for AssignmentHistory {
    type Error = HistoryError;

    fn try_from(events: Vec<AssignmentEvent>) -> Result<Self, Self::Error> {
        Self::from_events(events)
    }
}

impl From<AssignmentHistory> for Vec<AssignmentEvent> {
    fn from(history: AssignmentHistory) -> Self {
        history.0
    }
}

/// Free-form descriptive attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetails {
    /// Display name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_expiry: Option<NaiveDate>,
}

impl AssetDetails {
    /// Details with only a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A tracked inventory item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Stable identifier, never changes
    pub id: AssetId,
    /// Owning tenant
    pub tenant: TenantId,
    /// Human-readable short code, unique within the tenant
    pub asset_tag: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Lifecycle status
    pub status: AssetStatus,
    /// Present iff `status == Assigned`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
    #[serde(flatten)]
    pub details: AssetDetails,
    /// Creation time, never changes
    pub created_at: DateTime<Utc>,
    /// Append-only audit trail
    #[serde(default)]
    pub assignment_history: AssignmentHistory,
}

impl Asset {
    /// Id of the current holder
    #[inline]
    #[must_use]
    pub fn assigned_user_id(&self) -> Option<&UserId> {
        self.assignee.as_ref().map(|a| &a.user_id)
    }

    /// Name of the current holder
    #[inline]
    #[must_use]
    pub fn assigned_user_name(&self) -> Option<&str> {
        self.assignee.as_ref().map(|a| a.user_name.as_str())
    }

    /// `status == Assigned` iff an assignee is recorded
    #[inline]
    #[must_use]
    pub fn assignment_consistent(&self) -> bool {
        (self.status == AssetStatus::Assigned) == self.assignee.is_some()
    }
}

/// Input to asset creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDraft {
    /// Requested tag
    pub asset_tag: String,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    #[serde(flatten)]
    pub details: AssetDetails,
    /// Initial status, `available` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AssetStatus>,
}

impl AssetDraft {
    /// Statuses an asset may start in
    pub const INITIAL_STATUSES: [AssetStatus; 3] = [
        AssetStatus::Available,
        AssetStatus::InRepair,
        AssetStatus::Retired,
    ];

    /// Draft with a tag and a name
    #[must_use]
    pub fn new(asset_tag: impl Into<String>, name: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            asset_tag: asset_tag.into(),
            asset_type,
            details: AssetDetails::named(name),
            status: None,
        }
    }

    /// With serial number
    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.details.serial_number = Some(serial.into());
        self
    }

    /// With category name
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.details.category_name = Some(category.into());
        self
    }

    /// With department name
    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.details.department_name = Some(department.into());
        self
    }

    /// With location name
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.details.location_name = Some(location.into());
        self
    }

    /// With explicit initial status
    #[must_use]
    pub fn with_status(mut self, status: AssetStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Status the asset will be created with
    #[inline]
    #[must_use]
    pub fn initial_status(&self) -> AssetStatus {
        self.status.unwrap_or(AssetStatus::Available)
    }

    /// Check required fields and the initial status
    ///
    /// # Errors
    /// Returns [`InventoryError::InvalidDraft`] describing the first problem.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.asset_tag.trim().is_empty() {
            return Err(InventoryError::InvalidDraft("asset tag is required".into()));
        }
        if self.details.name.trim().is_empty() {
            return Err(InventoryError::InvalidDraft("name is required".into()));
        }
        let status = self.initial_status();
        if !Self::INITIAL_STATUSES.contains(&status) {
            return Err(InventoryError::InvalidDraft(format!(
                "assets cannot be created as {status}"
            )));
        }
        Ok(())
    }
}

/// Explicit edit of non-lifecycle fields
///
/// Status, assignee and history are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<AssetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<AssetDetails>,
}

impl AssetEdit {
    /// Check the edited fields
    ///
    /// # Errors
    /// Returns [`InventoryError::InvalidDraft`] for blank tag or name.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.asset_tag.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(InventoryError::InvalidDraft("asset tag is required".into()));
        }
        if self
            .details
            .as_ref()
            .is_some_and(|d| d.name.trim().is_empty())
        {
            return Err(InventoryError::InvalidDraft("name is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn status_wire_names_round_trip() {
        for status in AssetStatus::ALL {
            assert_eq!(status.as_str().parse::<AssetStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("broken".parse::<AssetStatus>().is_err());
    }

    #[test]
    fn history_rejects_out_of_order_entries() {
        let mut history = AssignmentHistory::new();
        history
            .append(AssignmentEvent::new(AssignmentAction::Assigned, "Ansh", at(10)))
            .unwrap();
        let err = history
            .append(AssignmentEvent::new(AssignmentAction::Unassigned, "Ansh", at(5)))
            .unwrap_err();
        assert!(matches!(err, HistoryError::OutOfOrder { .. }));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn history_accepts_equal_timestamps() {
        let history = AssignmentHistory::from_events(vec![
            AssignmentEvent::new(AssignmentAction::Assigned, "Ansh", at(10)),
            AssignmentEvent::new(AssignmentAction::Unassigned, "Ansh", at(10)),
        ])
        .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn history_prefix_detects_rewrites() {
        let original = AssignmentHistory::from_events(vec![AssignmentEvent::new(
            AssignmentAction::Assigned,
            "Ansh",
            at(1),
        )])
        .unwrap();
        let mut extended = original.clone();
        extended
            .append(AssignmentEvent::new(AssignmentAction::Unassigned, "Ansh", at(2)))
            .unwrap();
        let rewritten = AssignmentHistory::from_events(vec![AssignmentEvent::new(
            AssignmentAction::Assigned,
            "Mallory",
            at(1),
        )])
        .unwrap();

        assert!(original.is_prefix_of(&extended));
        assert!(!extended.is_prefix_of(&original));
        assert!(!original.is_prefix_of(&rewritten));
    }

    #[test]
    fn history_deserialization_checks_order() {
        let json = r#"[
            {"action":"assigned","userName":"A","timestamp":"2024-01-02T00:00:00Z"},
            {"action":"unassigned","userName":"A","timestamp":"2024-01-01T00:00:00Z"}
        ]"#;
        assert!(serde_json::from_str::<AssignmentHistory>(json).is_err());
    }

    #[test]
    fn draft_validation() {
        let draft = AssetDraft::new("LAPTOP-001", "Dell XPS 15", AssetType::Hardware);
        assert!(draft.validate().is_ok());
        assert_eq!(draft.initial_status(), AssetStatus::Available);

        let blank = AssetDraft::new("  ", "Dell XPS 15", AssetType::Hardware);
        assert!(matches!(blank.validate(), Err(InventoryError::InvalidDraft(_))));

        let assigned = draft.clone().with_status(AssetStatus::Assigned);
        assert!(matches!(assigned.validate(), Err(InventoryError::InvalidDraft(_))));

        let disposed = draft.with_status(AssetStatus::Disposed);
        assert!(disposed.validate().is_err());
    }
}
