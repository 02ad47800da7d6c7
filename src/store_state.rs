//! State tree, action tagged union and the pure reducer.
//!
//! [`reduce`] is the only place state changes. It takes the previous state by
//! value and returns the next one; it performs no I/O. Persistence of the
//! settings, favorites and location slices is the store's job, driven by
//! [`Action::persisted_slice`].

use serde::{Deserialize, Serialize};

use crate::civic_model::{
    AlertType, CommunityEvent, Coordinates, Entity, FavoriteKind, GovernmentResource, LocalAlert,
    Service,
};

/// Last known location of the user. At most one per session, replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Per-kind lists of favorited ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Favorites {
    pub services: Vec<String>,
    pub resources: Vec<String>,
    pub events: Vec<String>,
}

impl Favorites {
    pub fn ids(&self, kind: FavoriteKind) -> &[String] {
        match kind {
            FavoriteKind::Services => &self.services,
            FavoriteKind::Resources => &self.resources,
            FavoriteKind::Events => &self.events,
        }
    }

    fn ids_mut(&mut self, kind: FavoriteKind) -> &mut Vec<String> {
        match kind {
            FavoriteKind::Services => &mut self.services,
            FavoriteKind::Resources => &mut self.resources,
            FavoriteKind::Events => &mut self.events,
        }
    }

    pub fn contains(&self, kind: FavoriteKind, id: &str) -> bool {
        self.ids(kind).iter().any(|favorite| favorite == id)
    }

    /// Iterates every `(kind, id)` pair, in kind order.
    pub fn entries(&self) -> impl Iterator<Item = (FavoriteKind, &str)> + '_ {
        [FavoriteKind::Services, FavoriteKind::Resources, FavoriteKind::Events]
            .into_iter()
            .flat_map(move |kind| self.ids(kind).iter().map(move |id| (kind, id.as_str())))
    }
}

/// User preferences. Always present; starts at [`Settings::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub notifications_enabled: bool,
    pub alert_types: Vec<AlertType>,
    /// Miles.
    pub max_distance: f64,
    pub language: String,
    pub accessibility: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            notifications_enabled: true,
            alert_types: vec![AlertType::Emergency, AlertType::Warning, AlertType::Info],
            max_distance: 50.0,
            language: "en".to_string(),
            accessibility: false,
        }
    }
}

/// Partial settings, merged field by field over the current settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_types: Option<Vec<AlertType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<bool>,
}

impl SettingsPatch {
    fn apply_to(self, settings: &mut Settings) {
        if let Some(enabled) = self.notifications_enabled {
            settings.notifications_enabled = enabled;
        }
        if let Some(alert_types) = self.alert_types {
            settings.alert_types = alert_types;
        }
        if let Some(max_distance) = self.max_distance {
            settings.max_distance = max_distance;
        }
        if let Some(language) = self.language {
            settings.language = language;
        }
        if let Some(accessibility) = self.accessibility {
            settings.accessibility = accessibility;
        }
    }
}

/// The whole state tree owned by a [`CivicStore`](crate::civic_store::CivicStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub services: Vec<Service>,
    pub resources: Vec<GovernmentResource>,
    pub alerts: Vec<LocalAlert>,
    pub events: Vec<CommunityEvent>,
    pub user_location: Option<UserLocation>,
    pub favorites: Favorites,
    pub is_loading: bool,
    /// Last operation failure. Never cleared by the store itself.
    pub error: Option<String>,
    pub settings: Settings,
}

/// Slices of state mirrored to durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistedSlice {
    Settings,
    Favorites,
    UserLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetLoading(bool),
    SetError(Option<String>),

    SetServices(Vec<Service>),
    AddService(Service),
    UpdateService(Service),
    RemoveService(String),

    SetResources(Vec<GovernmentResource>),
    AddResource(GovernmentResource),
    UpdateResource(GovernmentResource),
    RemoveResource(String),

    SetAlerts(Vec<LocalAlert>),
    AddAlert(LocalAlert),
    UpdateAlert(LocalAlert),
    RemoveAlert(String),

    SetEvents(Vec<CommunityEvent>),
    AddEvent(CommunityEvent),
    UpdateEvent(CommunityEvent),
    RemoveEvent(String),

    SetUserLocation(Option<UserLocation>),
    AddFavorite { kind: FavoriteKind, id: String },
    RemoveFavorite { kind: FavoriteKind, id: String },
    SetSettings(SettingsPatch),
}

impl Action {
    /// Tag name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetLoading(_) => "SET_LOADING",
            Action::SetError(_) => "SET_ERROR",
            Action::SetServices(_) => "SET_SERVICES",
            Action::AddService(_) => "ADD_SERVICE",
            Action::UpdateService(_) => "UPDATE_SERVICE",
            Action::RemoveService(_) => "REMOVE_SERVICE",
            Action::SetResources(_) => "SET_RESOURCES",
            Action::AddResource(_) => "ADD_RESOURCE",
            Action::UpdateResource(_) => "UPDATE_RESOURCE",
            Action::RemoveResource(_) => "REMOVE_RESOURCE",
            Action::SetAlerts(_) => "SET_ALERTS",
            Action::AddAlert(_) => "ADD_ALERT",
            Action::UpdateAlert(_) => "UPDATE_ALERT",
            Action::RemoveAlert(_) => "REMOVE_ALERT",
            Action::SetEvents(_) => "SET_EVENTS",
            Action::AddEvent(_) => "ADD_EVENT",
            Action::UpdateEvent(_) => "UPDATE_EVENT",
            Action::RemoveEvent(_) => "REMOVE_EVENT",
            Action::SetUserLocation(_) => "SET_USER_LOCATION",
            Action::AddFavorite { .. } => "ADD_FAVORITE",
            Action::RemoveFavorite { .. } => "REMOVE_FAVORITE",
            Action::SetSettings(_) => "SET_SETTINGS",
        }
    }

    /// The durable slice this action changes, if any.
    pub fn persisted_slice(&self) -> Option<PersistedSlice> {
        match self {
            Action::SetSettings(_) => Some(PersistedSlice::Settings),
            Action::AddFavorite { .. } | Action::RemoveFavorite { .. } => {
                Some(PersistedSlice::Favorites)
            }
            Action::SetUserLocation(_) => Some(PersistedSlice::UserLocation),
            _ => None,
        }
    }
}

fn replace_by_id<T: Entity>(items: &mut [T], record: T) {
    if let Some(slot) = items.iter_mut().find(|item| item.id() == record.id()) {
        *slot = record;
    }
}

fn remove_by_id<T: Entity>(items: &mut Vec<T>, id: &str) {
    items.retain(|item| item.id() != id);
}

pub fn reduce(mut state: StoreState, action: Action) -> StoreState {
    match action {
        Action::SetLoading(loading) => state.is_loading = loading,
        Action::SetError(error) => state.error = error,

        Action::SetServices(services) => state.services = services,
        Action::AddService(service) => state.services.push(service),
        Action::UpdateService(service) => replace_by_id(&mut state.services, service),
        Action::RemoveService(id) => remove_by_id(&mut state.services, &id),

        Action::SetResources(resources) => state.resources = resources,
        Action::AddResource(resource) => state.resources.push(resource),
        Action::UpdateResource(resource) => replace_by_id(&mut state.resources, resource),
        Action::RemoveResource(id) => remove_by_id(&mut state.resources, &id),

        Action::SetAlerts(alerts) => state.alerts = alerts,
        Action::AddAlert(alert) => state.alerts.push(alert),
        Action::UpdateAlert(alert) => replace_by_id(&mut state.alerts, alert),
        Action::RemoveAlert(id) => remove_by_id(&mut state.alerts, &id),

        Action::SetEvents(events) => state.events = events,
        Action::AddEvent(event) => state.events.push(event),
        Action::UpdateEvent(event) => replace_by_id(&mut state.events, event),
        Action::RemoveEvent(id) => remove_by_id(&mut state.events, &id),

        Action::SetUserLocation(location) => state.user_location = location,
        Action::AddFavorite { kind, id } => {
            if !state.favorites.contains(kind, &id) {
                state.favorites.ids_mut(kind).push(id);
            }
        }
        Action::RemoveFavorite { kind, id } => {
            state.favorites.ids_mut(kind).retain(|favorite| *favorite != id);
        }
        Action::SetSettings(patch) => patch.apply_to(&mut state.settings),
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_matches_defaults() {
        let state = StoreState::default();
        assert!(state.services.is_empty());
        assert!(state.user_location.is_none());
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert!(state.settings.notifications_enabled);
        assert_eq!(state.settings.max_distance, 50.0);
        assert_eq!(state.settings.language, "en");
        assert_eq!(
            state.settings.alert_types,
            vec![AlertType::Emergency, AlertType::Warning, AlertType::Info]
        );
    }

    #[test]
    fn add_favorite_is_deduplicated() {
        let mut state = StoreState::default();
        for _ in 0..3 {
            state = reduce(
                state,
                Action::AddFavorite { kind: FavoriteKind::Events, id: "e1".to_string() },
            );
        }
        assert_eq!(state.favorites.events, vec!["e1".to_string()]);

        state = reduce(
            state,
            Action::RemoveFavorite { kind: FavoriteKind::Events, id: "e1".to_string() },
        );
        assert!(state.favorites.events.is_empty());
    }

    #[test]
    fn settings_patch_merges_only_given_fields() {
        let state = reduce(
            StoreState::default(),
            Action::SetSettings(SettingsPatch {
                language: Some("es".to_string()),
                ..SettingsPatch::default()
            }),
        );
        assert_eq!(state.settings.language, "es");
        assert!(state.settings.notifications_enabled);
        assert_eq!(state.settings.max_distance, 50.0);
    }

    #[test]
    fn persisted_slices() {
        assert_eq!(Action::SetLoading(true).persisted_slice(), None);
        assert_eq!(
            Action::SetUserLocation(None).persisted_slice(),
            Some(PersistedSlice::UserLocation)
        );
        assert_eq!(
            Action::SetSettings(SettingsPatch::default()).persisted_slice(),
            Some(PersistedSlice::Settings)
        );
    }
}
