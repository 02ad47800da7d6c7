//! Entity records managed by the civic services store.
//!
//! There are four sibling kinds: [`Service`], [`GovernmentResource`],
//! [`LocalAlert`] and [`CommunityEvent`]. None of them references another.
//!
//! Every kind is split into a *draft* (the caller-supplied fields) and the
//! store-managed envelope (`id` plus timestamps). The draft is flattened into
//! the record on serialization, so a stored record is one flat camelCase JSON
//! object:
//!
//! ```rust
//! use civic_services_core::civic_model::{AlertDraft, AlertSeverity};
//! use serde_json::json;
//!
//! let draft: AlertDraft = serde_json::from_value(json!({
//!     "title": "Boil water notice",
//!     "message": "Boil tap water before drinking",
//!     "type": "warning",
//!     "severity": "high",
//!     "category": "health",
//!     "startTime": "2024-05-01T12:00:00Z",
//!     "isActive": true,
//!     "source": "City Water Department"
//! }))?;
//! assert_eq!(draft.severity, AlertSeverity::High);
//! # Ok::<(), serde_json::Error>(())
//! ```
//!
//! Patches ([`ServicePatch`] and friends) carry every draft field as an
//! `Option`. They have no `id`, `createdAt` or `updatedAt`, so an update can
//! never rewrite identity or creation time.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StoreError;
use crate::store_state::{Action, StoreState};

/// The four collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Services,
    Resources,
    Alerts,
    Events,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Services => "services",
            EntityKind::Resources => "resources",
            EntityKind::Alerts => "alerts",
            EntityKind::Events => "events",
        }
    }

    /// Singular, capitalized name used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Services => "Service",
            EntityKind::Resources => "Resource",
            EntityKind::Alerts => "Alert",
            EntityKind::Events => "Event",
        }
    }

    /// Leading segment of generated ids, e.g. `service_1714567890123_k3j9x0a1b`.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EntityKind::Services => "service",
            EntityKind::Resources => "resource",
            EntityKind::Alerts => "alert",
            EntityKind::Events => "event",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "services" | "service" => Ok(EntityKind::Services),
            "resources" | "resource" => Ok(EntityKind::Resources),
            "alerts" | "alert" => Ok(EntityKind::Alerts),
            "events" | "event" => Ok(EntityKind::Events),
            _ => Err(StoreError::UnknownKind(s.to_string())),
        }
    }
}

/// Kinds that can be marked as favorites. Alerts are not favoritable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
    Services,
    Resources,
    Events,
}

impl From<FavoriteKind> for EntityKind {
    fn from(kind: FavoriteKind) -> Self {
        match kind {
            FavoriteKind::Services => EntityKind::Services,
            FavoriteKind::Resources => EntityKind::Resources,
            FavoriteKind::Events => EntityKind::Events,
        }
    }
}

impl FromStr for FavoriteKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<EntityKind>()? {
            EntityKind::Services => Ok(FavoriteKind::Services),
            EntityKind::Resources => Ok(FavoriteKind::Resources),
            EntityKind::Events => Ok(FavoriteKind::Events),
            EntityKind::Alerts => Err(StoreError::UnknownKind(format!("{s} (not favoritable)"))),
        }
    }
}

/// Serialization format accepted by export and import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(StoreError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Health,
    Education,
    Housing,
    Employment,
    Legal,
    Transportation,
    Utilities,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Government,
    Nonprofit,
    Community,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Active,
    Inactive,
    Temporary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLocation {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub phone: String,
    pub email: String,
    pub website: String,
    pub hours: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Eligibility {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Range<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<Range<f64>>,
    pub residency: Vec<String>,
    pub requirements: Vec<String>,
}

/// Caller-supplied part of a [`Service`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    #[serde(rename = "type")]
    pub kind: ServiceType,
    #[serde(default)]
    pub location: ServiceLocation,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub eligibility: Eligibility,
    /// Services offered at this listing.
    #[serde(default)]
    pub services: Vec<String>,
    /// Documents an applicant has to bring.
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub status: ServiceStatus,
    #[serde(default, deserialize_with = "lenient")]
    pub rating: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub reviews: u32,
}

/// A civic, government or community service listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(flatten)]
    pub details: ServiceDraft,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ServiceCategory>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ServiceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ServiceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<Eligibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
}

// ---------------------------------------------------------------------------
// GovernmentResource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Forms,
    Information,
    Guidelines,
    Regulations,
    Benefits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Doc,
    Html,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDraft {
    pub title: String,
    pub description: String,
    pub category: ResourceCategory,
    /// Issuing agency.
    pub agency: String,
    pub url: String,
    pub file_type: FileType,
    /// Size in bytes, when known.
    #[serde(default, deserialize_with = "lenient_option", skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Languages the document is available in.
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Supplied by the caller; the store never stamps it.
    pub last_updated: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_free: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub requires_auth: bool,
}

/// A downloadable or informational government document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernmentResource {
    pub id: String,
    #[serde(flatten)]
    pub details: ResourceDraft,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourcePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ResourceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub file_size: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_free: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
}

// ---------------------------------------------------------------------------
// LocalAlert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Emergency,
    Warning,
    Info,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Weather,
    Traffic,
    Safety,
    Health,
    Utility,
    General,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertLocation {
    pub city: String,
    pub state: String,
    pub affected_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    #[serde(default)]
    pub location: AlertLocation,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Alerts are never expired by `end_time`; deactivation is an explicit update.
    #[serde(deserialize_with = "lenient")]
    pub is_active: bool,
    #[serde(default)]
    pub source: String,
    /// Suggested actions for residents.
    #[serde(default)]
    pub actions: Vec<String>,
}

/// A civic or emergency notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAlert {
    pub id: String,
    #[serde(flatten)]
    pub details: AlertDraft,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AlertType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<AlertCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<AlertLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// CommunityEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Meeting,
    Workshop,
    Celebration,
    Protest,
    Volunteer,
    Educational,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLocation {
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventSchedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub category: EventCategory,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub location: EventLocation,
    pub date_time: EventSchedule,
    #[serde(default, deserialize_with = "lenient")]
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attendees: u32,
    #[serde(default, deserialize_with = "lenient_option", skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A local community gathering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityEvent {
    pub id: String,
    #[serde(flatten)]
    pub details: EventDraft,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<EventLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<EventSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_virtual: Option<bool>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub virtual_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<u32>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Distinguishes an explicit `null` (clear the field) from an absent key
/// (leave it alone) in patch JSON.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOr<T> {
    Value(T),
    Text(String),
}

/// Accepts the value itself or its text form, as CSV import produces.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match TextOr::<T>::deserialize(deserializer)? {
        TextOr::Value(value) => Ok(value),
        TextOr::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Like [`lenient`]; an empty cell means `None`.
fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<TextOr<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TextOr::Value(value)) => Ok(Some(value)),
        Some(TextOr::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(TextOr::Text(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Shallow merge: every `Some` in the patch replaces the draft field wholesale.
macro_rules! merge_patch {
    ($patch:expr => $draft:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $draft.$field = value;
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Ties a record type to its draft, patch, collection and reducer actions so
/// the store can implement create/update/remove once.
pub trait Entity: Clone + Serialize + Sized {
    type Draft: DeserializeOwned;
    type Patch;

    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Builds a new record; `now` becomes every store-managed timestamp.
    fn create(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Merges `patch` over the record. `now` refreshes `updatedAt` where the
    /// kind carries one.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    fn collection(state: &StoreState) -> &[Self];

    fn add_action(self) -> Action;

    fn update_action(self) -> Action;

    fn remove_action(id: String) -> Action;
}

impl Entity for Service {
    type Draft = ServiceDraft;
    type Patch = ServicePatch;

    const KIND: EntityKind = EntityKind::Services;

    fn id(&self) -> &str {
        &self.id
    }

    fn create(id: String, draft: ServiceDraft, now: DateTime<Utc>) -> Self {
        Service {
            id,
            details: draft,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ServicePatch, now: DateTime<Utc>) {
        merge_patch!(patch => self.details;
            name, description, category, kind, location, contact, eligibility,
            services, documents, status, rating, reviews);
        // never move backwards, even if the clock does
        self.updated_at = now.max(self.updated_at);
    }

    fn collection(state: &StoreState) -> &[Self] {
        &state.services
    }

    fn add_action(self) -> Action {
        Action::AddService(self)
    }

    fn update_action(self) -> Action {
        Action::UpdateService(self)
    }

    fn remove_action(id: String) -> Action {
        Action::RemoveService(id)
    }
}

impl Entity for GovernmentResource {
    type Draft = ResourceDraft;
    type Patch = ResourcePatch;

    const KIND: EntityKind = EntityKind::Resources;

    fn id(&self) -> &str {
        &self.id
    }

    fn create(id: String, draft: ResourceDraft, _now: DateTime<Utc>) -> Self {
        GovernmentResource { id, details: draft }
    }

    fn apply_patch(&mut self, patch: ResourcePatch, _now: DateTime<Utc>) {
        merge_patch!(patch => self.details;
            title, description, category, agency, url, file_type, file_size,
            language, tags, last_updated, is_free, requires_auth);
    }

    fn collection(state: &StoreState) -> &[Self] {
        &state.resources
    }

    fn add_action(self) -> Action {
        Action::AddResource(self)
    }

    fn update_action(self) -> Action {
        Action::UpdateResource(self)
    }

    fn remove_action(id: String) -> Action {
        Action::RemoveResource(id)
    }
}

impl Entity for LocalAlert {
    type Draft = AlertDraft;
    type Patch = AlertPatch;

    const KIND: EntityKind = EntityKind::Alerts;

    fn id(&self) -> &str {
        &self.id
    }

    fn create(id: String, draft: AlertDraft, now: DateTime<Utc>) -> Self {
        LocalAlert {
            id,
            details: draft,
            created_at: now,
        }
    }

    fn apply_patch(&mut self, patch: AlertPatch, _now: DateTime<Utc>) {
        merge_patch!(patch => self.details;
            title, message, kind, severity, category, location, start_time,
            end_time, is_active, source, actions);
    }

    fn collection(state: &StoreState) -> &[Self] {
        &state.alerts
    }

    fn add_action(self) -> Action {
        Action::AddAlert(self)
    }

    fn update_action(self) -> Action {
        Action::UpdateAlert(self)
    }

    fn remove_action(id: String) -> Action {
        Action::RemoveAlert(id)
    }
}

impl Entity for CommunityEvent {
    type Draft = EventDraft;
    type Patch = EventPatch;

    const KIND: EntityKind = EntityKind::Events;

    fn id(&self) -> &str {
        &self.id
    }

    fn create(id: String, draft: EventDraft, now: DateTime<Utc>) -> Self {
        CommunityEvent {
            id,
            details: draft,
            created_at: now,
        }
    }

    fn apply_patch(&mut self, patch: EventPatch, _now: DateTime<Utc>) {
        merge_patch!(patch => self.details;
            title, description, category, organizer, location, date_time,
            is_virtual, virtual_url, attendees, max_attendees, is_public, tags);
    }

    fn collection(state: &StoreState) -> &[Self] {
        &state.events
    }

    fn add_action(self) -> Action {
        Action::AddEvent(self)
    }

    fn update_action(self) -> Action {
        Action::UpdateEvent(self)
    }

    fn remove_action(id: String) -> Action {
        Action::RemoveEvent(id)
    }
}
