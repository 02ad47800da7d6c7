//! The civic services store: owner and sole mutator of all state.
//!
//! A [`CivicStore`] is built once at startup around a [`KeyValueStore`] and
//! passed by reference to whatever needs it. Every change goes through
//! [`CivicStore::dispatch`], which runs the pure reducer and then mirrors the
//! settings, favorites and location slices to storage.
//!
//! Mutating operations never fail from the caller's point of view. A problem
//! such as updating an unknown id is logged and recorded in
//! [`StoreState::error`], which stays set until someone clears it.
//!
//! ```rust
//! use civic_services_core::civic_store::CivicStore;
//! use civic_services_core::local_storage::MemoryStorage;
//! use civic_services_core::search::ServiceFilters;
//! use civic_services_core::civic_model::ServiceDraft;
//! use serde_json::json;
//!
//! let mut store = CivicStore::new(MemoryStorage::new());
//! let draft: ServiceDraft = serde_json::from_value(json!({
//!     "name": "Food Bank",
//!     "description": "Weekly groceries",
//!     "category": "health",
//!     "type": "nonprofit",
//!     "location": {"address": "1 Main St", "city": "Springfield", "state": "IL", "zipCode": "62701"}
//! }))?;
//! let id = store.add_service(draft);
//!
//! let found = store.search_services("food", &ServiceFilters::default());
//! assert_eq!(found[0].id, id);
//! # Ok::<(), serde_json::Error>(())
//! ```

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::civic_model::{
    AlertDraft, AlertPatch, CommunityEvent, Entity, EntityKind, EventDraft, EventPatch,
    ExportFormat, FavoriteKind, GovernmentResource, LocalAlert, ResourceDraft, ResourcePatch,
    Service, ServiceDraft, ServicePatch,
};
use crate::error::StoreError;
use crate::local_storage::{
    KeyValueStore, LmdbStorage, FAVORITES_KEY, SETTINGS_KEY, USER_LOCATION_KEY,
};
use crate::search::{self, EventFilters, ResourceFilters, ServiceFilters};
use crate::store_state::{
    reduce, Action, Favorites, PersistedSlice, Settings, SettingsPatch, StoreState, UserLocation,
};
use crate::transfer;

/// Radius used by [`CivicStore::get_nearby_services`] when none is given.
pub const DEFAULT_RADIUS_MILES: f64 = 50.0;

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of "now" for ids and timestamps.
pub type Clock = fn() -> DateTime<Utc>;

pub struct CivicStore<S: KeyValueStore> {
    state: StoreState,
    storage: S,
    clock: Clock,
}

impl<S: KeyValueStore> CivicStore<S> {
    /// Builds the store and seeds settings, favorites and location from
    /// `storage`. Unreadable entries are logged and left at their defaults.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Utc::now)
    }

    pub fn with_clock(storage: S, clock: Clock) -> Self {
        let state = load_persisted(&storage);
        info!(
            "Civic store ready ({} favorites, location {})",
            state.favorites.entries().count(),
            if state.user_location.is_some() { "restored" } else { "unset" }
        );
        CivicStore { state, storage, clock }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Gives the storage back, e.g. to reopen a store over the same data.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Applies `action` through the reducer, then writes the persisted slice
    /// it touched. Write failures are logged, never surfaced.
    pub fn dispatch(&mut self, action: Action) {
        debug!("dispatch {}", action.name());
        let slice = action.persisted_slice();
        let previous = std::mem::take(&mut self.state);
        self.state = reduce(previous, action);
        if let Some(slice) = slice {
            self.persist(slice);
        }
    }

    fn persist(&self, slice: PersistedSlice) {
        let result = match slice {
            PersistedSlice::Settings => write_json(&self.storage, SETTINGS_KEY, &self.state.settings),
            PersistedSlice::Favorites => {
                write_json(&self.storage, FAVORITES_KEY, &self.state.favorites)
            }
            PersistedSlice::UserLocation => match &self.state.user_location {
                Some(location) => write_json(&self.storage, USER_LOCATION_KEY, location),
                None => self.storage.remove_item(USER_LOCATION_KEY),
            },
        };
        if let Err(e) = result {
            warn!("Failed to persist {slice:?}: {e}");
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.dispatch(Action::SetLoading(loading));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.dispatch(Action::SetError(Some(message.into())));
    }

    /// Consumers call this once they have shown the error.
    pub fn clear_error(&mut self) {
        self.dispatch(Action::SetError(None));
    }

    fn record_failure(&mut self, operation: &str, kind: EntityKind, err: StoreError) {
        let label = kind.label().to_lowercase();
        warn!("Error trying to {operation} {label}: {err}");
        self.dispatch(Action::SetError(Some(format!("Failed to {operation} {label}: {err}"))));
    }

    // -- generic record plumbing --------------------------------------------

    fn find<E: Entity>(&self, id: &str) -> Option<&E> {
        E::collection(&self.state).iter().find(|record| record.id() == id)
    }

    /// `<prefix>_<unix millis>_<9 base36 chars>`, unique within the collection.
    fn fresh_id<E: Entity>(&self, now: DateTime<Utc>) -> String {
        loop {
            let suffix: String = (0..ID_SUFFIX_LEN)
                .map(|_| BASE36[fastrand::usize(..BASE36.len())] as char)
                .collect();
            let id = format!("{}_{}_{}", E::KIND.id_prefix(), now.timestamp_millis(), suffix);
            if self.find::<E>(&id).is_none() {
                return id;
            }
        }
    }

    fn add_record<E: Entity>(&mut self, draft: E::Draft) -> String {
        let now = (self.clock)();
        let id = self.fresh_id::<E>(now);
        self.dispatch(E::create(id.clone(), draft, now).add_action());
        id
    }

    fn try_update<E: Entity>(&mut self, id: &str, patch: E::Patch) -> Result<(), StoreError> {
        let mut record = self
            .find::<E>(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { kind: E::KIND, id: id.to_string() })?;
        record.apply_patch(patch, (self.clock)());
        self.dispatch(record.update_action());
        Ok(())
    }

    fn update_record<E: Entity>(&mut self, id: &str, patch: E::Patch) {
        if let Err(err) = self.try_update::<E>(id, patch) {
            self.record_failure("update", E::KIND, err);
        }
    }

    fn remove_record<E: Entity>(&mut self, id: &str) {
        self.dispatch(E::remove_action(id.to_string()));
    }

    // -- services ------------------------------------------------------------

    pub fn search_services(&self, query: &str, filters: &ServiceFilters) -> Vec<&Service> {
        search::search_services(&self.state.services, query, filters)
    }

    pub fn get_service(&self, id: &str) -> Option<&Service> {
        self.find(id)
    }

    /// Stamps id, `createdAt` and `updatedAt`, and returns the new id.
    pub fn add_service(&mut self, draft: ServiceDraft) -> String {
        self.add_record::<Service>(draft)
    }

    pub fn update_service(&mut self, id: &str, patch: ServicePatch) {
        self.update_record::<Service>(id, patch);
    }

    pub fn remove_service(&mut self, id: &str) {
        self.remove_record::<Service>(id);
    }

    // -- resources -----------------------------------------------------------

    pub fn search_resources(&self, query: &str, filters: &ResourceFilters) -> Vec<&GovernmentResource> {
        search::search_resources(&self.state.resources, query, filters)
    }

    pub fn get_resource(&self, id: &str) -> Option<&GovernmentResource> {
        self.find(id)
    }

    pub fn add_resource(&mut self, draft: ResourceDraft) -> String {
        self.add_record::<GovernmentResource>(draft)
    }

    pub fn update_resource(&mut self, id: &str, patch: ResourcePatch) {
        self.update_record::<GovernmentResource>(id, patch);
    }

    pub fn remove_resource(&mut self, id: &str) {
        self.remove_record::<GovernmentResource>(id);
    }

    // -- alerts --------------------------------------------------------------

    /// Exactly the alerts flagged active; `endTime` plays no part.
    pub fn get_active_alerts(&self) -> Vec<&LocalAlert> {
        self.state.alerts.iter().filter(|alert| alert.details.is_active).collect()
    }

    pub fn get_alert(&self, id: &str) -> Option<&LocalAlert> {
        self.find(id)
    }

    pub fn add_alert(&mut self, draft: AlertDraft) -> String {
        self.add_record::<LocalAlert>(draft)
    }

    pub fn update_alert(&mut self, id: &str, patch: AlertPatch) {
        self.update_record::<LocalAlert>(id, patch);
    }

    pub fn remove_alert(&mut self, id: &str) {
        self.remove_record::<LocalAlert>(id);
    }

    // -- events --------------------------------------------------------------

    pub fn search_events(&self, query: &str, filters: &EventFilters) -> Vec<&CommunityEvent> {
        search::search_events(&self.state.events, query, filters)
    }

    pub fn get_event(&self, id: &str) -> Option<&CommunityEvent> {
        self.find(id)
    }

    pub fn add_event(&mut self, draft: EventDraft) -> String {
        self.add_record::<CommunityEvent>(draft)
    }

    pub fn update_event(&mut self, id: &str, patch: EventPatch) {
        self.update_record::<CommunityEvent>(id, patch);
    }

    pub fn remove_event(&mut self, id: &str) {
        self.remove_record::<CommunityEvent>(id);
    }

    // -- location ------------------------------------------------------------

    pub fn user_location(&self) -> Option<&UserLocation> {
        self.state.user_location.as_ref()
    }

    /// Replaces the location wholesale; `None` also drops the stored copy.
    pub fn set_user_location(&mut self, location: Option<UserLocation>) {
        self.dispatch(Action::SetUserLocation(location));
    }

    /// Services within `radius_miles` (default [`DEFAULT_RADIUS_MILES`]) of the
    /// user, by planar distance. Without user coordinates every service is
    /// returned; services without coordinates are never "nearby".
    pub fn get_nearby_services(&self, radius_miles: Option<f64>) -> Vec<&Service> {
        let radius = radius_miles.unwrap_or(DEFAULT_RADIUS_MILES);
        let Some(origin) = self.state.user_location.as_ref().and_then(|location| location.coordinates)
        else {
            return self.state.services.iter().collect();
        };

        self.state
            .services
            .iter()
            .filter(|service| {
                service
                    .details
                    .location
                    .coordinates
                    .is_some_and(|at| search::planar_distance_miles(origin, at) <= radius)
            })
            .collect()
    }

    // -- favorites -----------------------------------------------------------

    pub fn favorites(&self) -> &Favorites {
        &self.state.favorites
    }

    /// Adding an id that is already a favorite changes nothing.
    pub fn add_to_favorites(&mut self, kind: FavoriteKind, id: &str) {
        self.dispatch(Action::AddFavorite { kind, id: id.to_string() });
    }

    pub fn remove_from_favorites(&mut self, kind: FavoriteKind, id: &str) {
        self.dispatch(Action::RemoveFavorite { kind, id: id.to_string() });
    }

    pub fn is_favorite(&self, kind: FavoriteKind, id: &str) -> bool {
        self.state.favorites.contains(kind, id)
    }

    // -- settings ------------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.dispatch(Action::SetSettings(patch));
    }

    // -- import / export -----------------------------------------------------

    /// Serializes a whole collection. Unlike the mutators this can fail, and
    /// says so.
    pub fn export_data(&self, kind: EntityKind, format: ExportFormat) -> Result<String, StoreError> {
        match kind {
            EntityKind::Services => transfer::export(&self.state.services, format),
            EntityKind::Resources => transfer::export(&self.state.resources, format),
            EntityKind::Alerts => transfer::export(&self.state.alerts, format),
            EntityKind::Events => transfer::export(&self.state.events, format),
        }
    }

    /// Adds one record per row, in order, each with a freshly generated id.
    /// Unparseable input or rows that do not form a record end up in
    /// [`StoreState::error`]; good rows are still added.
    pub fn import_data(&mut self, kind: EntityKind, data: &str, format: ExportFormat) {
        let result = transfer::parse_rows(data, format).and_then(|rows| match kind {
            EntityKind::Services => self.import_rows::<Service>(rows),
            EntityKind::Resources => self.import_rows::<GovernmentResource>(rows),
            EntityKind::Alerts => self.import_rows::<LocalAlert>(rows),
            EntityKind::Events => self.import_rows::<CommunityEvent>(rows),
        });

        if let Err(err) = result {
            error!("Error importing {kind}: {err}");
            self.dispatch(Action::SetError(Some(format!("Failed to import data: {err}"))));
        }
    }

    fn import_rows<E: Entity>(&mut self, rows: Vec<Value>) -> Result<(), StoreError> {
        let total = rows.len();
        let mut failed = 0;
        for (index, row) in rows.into_iter().enumerate() {
            match serde_json::from_value::<E::Draft>(row) {
                Ok(draft) => {
                    self.add_record::<E>(draft);
                }
                Err(e) => {
                    warn!("Skipping {} row {}: {e}", E::KIND, index + 1);
                    failed += 1;
                }
            }
        }

        info!("Imported {} of {} {} rows", total - failed, total, E::KIND);
        if failed > 0 {
            return Err(StoreError::Import { kind: E::KIND, failed, total });
        }
        Ok(())
    }
}

impl CivicStore<LmdbStorage> {
    /// Starts over on an empty database named `name`: storage is reset and
    /// the whole state goes back to its initial value.
    pub fn reset_database(&mut self, name: &str) -> Result<(), StoreError> {
        self.storage.reset_database(name)?;
        self.state = StoreState::default();
        info!("Civic store reset onto {}", self.storage.path().display());
        Ok(())
    }
}

fn write_json<S: KeyValueStore, T: Serialize>(storage: &S, key: &str, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    storage.set_item(key, &json)
}

fn read_json<S: KeyValueStore, T: DeserializeOwned>(storage: &S, key: &str) -> Option<T> {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            error!("Error reading {key}: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Error loading {key}, keeping defaults: {e}");
            None
        }
    }
}

/// Reads each persisted key once, independently of the others. Goes through
/// the reducer but not through persistence: nothing is written back.
fn load_persisted<S: KeyValueStore>(storage: &S) -> StoreState {
    let mut state = StoreState::default();

    if let Some(settings) = read_json::<S, SettingsPatch>(storage, SETTINGS_KEY) {
        state = reduce(state, Action::SetSettings(settings));
    }

    if let Some(favorites) = read_json::<S, Favorites>(storage, FAVORITES_KEY) {
        for (kind, id) in favorites.entries() {
            state = reduce(state, Action::AddFavorite { kind, id: id.to_string() });
        }
    }

    if let Some(location) = read_json::<S, Option<UserLocation>>(storage, USER_LOCATION_KEY) {
        state = reduce(state, Action::SetUserLocation(location));
    }

    state
}
