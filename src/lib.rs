//! # Civic Services Core
//!
//! A local-first store for civic information: service listings, government
//! resources, local alerts and community events. The store keeps its
//! collections in memory and mirrors user settings, favorites and the last
//! known location to LMDB so they survive a restart.
//!
//! ## Features
//!
//! - **One owner**: a [`CivicStore`] holds all state; changes flow through a
//!   pure reducer ([`store_state::reduce`])
//! - **Errors as data**: mutators never fail to the caller; problems land in
//!   `state.error` for the UI to show and dismiss
//! - **Search and filters** per kind, plus a nearby-services radius filter
//! - **Favorites** for services, resources and events
//! - **Import/export** in JSON and a plain comma-separated CSV
//! - **FFI surface** returning JSON envelopes, for UI shells in other languages
//!
//! ## Quick Start
//!
//! ```no_run
//! use civic_services_core::{CivicStore, LmdbStorage};
//! use civic_services_core::civic_model::{ExportFormat, EntityKind, FavoriteKind};
//!
//! let storage = LmdbStorage::init("civic_data")?;
//! let mut store = CivicStore::new(storage);
//!
//! store.add_to_favorites(FavoriteKind::Services, "service_1714567890123_k3j9x0a1b");
//! let json = store.export_data(EntityKind::Services, ExportFormat::Json)?;
//! # Ok::<(), civic_services_core::StoreError>(())
//! ```
//!
//! ## FFI Functions
//!
//! - [`create_store`] / [`close_store`] - Store lifecycle
//! - [`get_state`] - Whole state tree as JSON
//! - [`search_records`], [`get_record`], [`active_alerts`] - Reads
//! - [`add_record`], [`update_record`], [`remove_record`] - Record mutations
//! - [`set_user_location`], [`nearby_services`] - Location
//! - [`toggle_favorite`], [`is_favorite`] - Favorites
//! - [`export_data`], [`import_data`] - Transfer
//! - [`clear_all_records`], [`reset_database`], [`close_database`] - Storage maintenance
//! - [`free_c_string`] - Release any string returned by this library

pub mod app_response;
pub mod civic_model;
pub mod civic_store;
pub mod error;
pub mod local_storage;
pub mod search;
pub mod store_state;
pub mod transfer;

pub use crate::civic_store::CivicStore;
pub use crate::error::StoreError;
pub use crate::local_storage::{KeyValueStore, LmdbStorage, MemoryStorage};

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app_response::AppResponse;
use crate::civic_model::{
    AlertDraft, AlertPatch, EntityKind, EventDraft, EventPatch, ExportFormat, FavoriteKind,
    ResourceDraft, ResourcePatch, ServiceDraft, ServicePatch,
};
use crate::search::{EventFilters, ResourceFilters, ServiceFilters};
use crate::store_state::UserLocation;

/// Store handle exposed over FFI.
pub type StoreHandle = CivicStore<LmdbStorage>;

/// Opens the LMDB environment `<name>.lmdb` and builds a store over it.
///
/// Persisted settings, favorites and location are loaded immediately.
///
/// # Parameters
///
/// * `name` - Null-terminated database name, optionally with a directory
///
/// # Returns
///
/// A pointer to the store, or null if the name is null, is not UTF-8, or the
/// environment cannot be opened. Release it with [`close_store`].
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use civic_services_core::create_store;
///
/// let name = CString::new("civic_data").unwrap();
/// let store = create_store(name.as_ptr());
/// assert!(!store.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char) -> *mut StoreHandle {
    if name.is_null() {
        warn!("Null name pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match LmdbStorage::init(name_str) {
        Ok(storage) => {
            info!("✅ Civic store opened at {}", storage.path().display());
            Box::into_raw(Box::new(CivicStore::new(storage)))
        }
        Err(e) => {
            warn!("❌ Failed to open civic store storage: {e}");
            warn!("Attempted path: {name_str}.lmdb");
            std::ptr::null_mut()
        }
    }
}

/// Drops the store and closes its LMDB environment.
///
/// # Returns
///
/// `Ok` once the store is gone, `BadRequest` for a null pointer.
///
/// # Safety
///
/// The pointer must come from [`create_store`] and must not be used again
/// after this call.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(store: *mut StoreHandle) -> *const c_char {
    if store.is_null() {
        let error = AppResponse::BadRequest("Null store pointer passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    drop(unsafe { Box::from_raw(store) });
    response_to_c_string(&AppResponse::success("Store closed successfully"))
}

/// Returns the full state tree as JSON.
///
/// # Returns
///
/// A JSON `AppResponse` C string; release it with [`free_c_string`].
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_state(store: *mut StoreHandle) -> *const c_char {
    let store = match store_ref(store, "get_state") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    ok_json(store.state())
}

/// Searches services, resources or events.
///
/// # Parameters
///
/// * `store` - Store pointer
/// * `kind` - `"services"`, `"resources"` or `"events"`
/// * `query` - Case-insensitive text; empty matches everything
/// * `filters_json` - Optional filters, e.g. `{"category":"health","city":"spring"}`
///   for services. Null, absent keys and `""` values mean no filter.
///
/// # Returns
///
/// `Ok` with a JSON array of matching records.
///
/// # Errors
///
/// `BadRequest` for null pointers, unknown kinds and `"alerts"` (use
/// [`active_alerts`]); `SerializationError` for malformed filters.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_records(
    store: *mut StoreHandle,
    kind: *const c_char,
    query: *const c_char,
    filters_json: *const c_char,
) -> *const c_char {
    let store = match store_ref(store, "search_records") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<EntityKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let query = match c_ptr_to_string(query, "query") {
        Ok(query) => query,
        Err(error_ptr) => return error_ptr,
    };

    match kind {
        EntityKind::Services => match optional_json::<ServiceFilters>(filters_json) {
            Ok(filters) => ok_json(&store.search_services(&query, &filters)),
            Err(error_ptr) => error_ptr,
        },
        EntityKind::Resources => match optional_json::<ResourceFilters>(filters_json) {
            Ok(filters) => ok_json(&store.search_resources(&query, &filters)),
            Err(error_ptr) => error_ptr,
        },
        EntityKind::Events => match optional_json::<EventFilters>(filters_json) {
            Ok(filters) => ok_json(&store.search_events(&query, &filters)),
            Err(error_ptr) => error_ptr,
        },
        EntityKind::Alerts => {
            let error = AppResponse::BadRequest("Alerts are not searchable".to_string());
            response_to_c_string(&error)
        }
    }
}

/// Returns the alerts currently flagged active.
///
/// # Returns
///
/// A JSON `AppResponse` C string; release it with [`free_c_string`].
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn active_alerts(store: *mut StoreHandle) -> *const c_char {
    let store = match store_ref(store, "active_alerts") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    ok_json(&store.get_active_alerts())
}

/// Looks up one record by id.
///
/// # Returns
///
/// `Ok` with the record JSON, or `NotFound` when no record has that id.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_record(
    store: *mut StoreHandle,
    kind: *const c_char,
    id: *const c_char,
) -> *const c_char {
    let store = match store_ref(store, "get_record") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<EntityKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    let found = match kind {
        EntityKind::Services => store.get_service(&id).map(serde_json::to_string),
        EntityKind::Resources => store.get_resource(&id).map(serde_json::to_string),
        EntityKind::Alerts => store.get_alert(&id).map(serde_json::to_string),
        EntityKind::Events => store.get_event(&id).map(serde_json::to_string),
    };

    match found {
        Some(Ok(json)) => response_to_c_string(&AppResponse::Ok(json)),
        Some(Err(e)) => response_to_c_string(&AppResponse::from(e)),
        None => {
            let error = AppResponse::NotFound(format!("No {} found with id: {id}", kind.label().to_lowercase()));
            response_to_c_string(&error)
        }
    }
}

/// Adds a record from its draft JSON and returns the generated id.
///
/// # JSON Format
///
/// The draft is the record without `id` and store-managed timestamps, e.g.
/// for an event:
///
/// ```json
/// {
///   "title": "Park cleanup",
///   "description": "Bring gloves",
///   "category": "volunteer",
///   "dateTime": { "start": "2024-06-01T15:00:00Z", "end": "2024-06-01T18:00:00Z" },
///   "isPublic": true
/// }
/// ```
///
/// # Returns
///
/// `Ok` with the new id as its payload.
///
/// # Errors
///
/// `SerializationError` if the JSON is not a valid draft for `kind`;
/// `BadRequest` for null pointers or unknown kinds.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_record(
    store: *mut StoreHandle,
    kind: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "add_record") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<EntityKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let json = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let added = match kind {
        EntityKind::Services => serde_json::from_str::<ServiceDraft>(&json).map(|d| store.add_service(d)),
        EntityKind::Resources => serde_json::from_str::<ResourceDraft>(&json).map(|d| store.add_resource(d)),
        EntityKind::Alerts => serde_json::from_str::<AlertDraft>(&json).map(|d| store.add_alert(d)),
        EntityKind::Events => serde_json::from_str::<EventDraft>(&json).map(|d| store.add_event(d)),
    };

    match added {
        Ok(id) => finish_mutation(store, id),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid {kind} draft: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Merges a patch JSON over an existing record.
///
/// Only the keys present in the patch change; `null` clears an optional
/// field.
///
/// # Returns
///
/// `Ok` when the record was updated.
///
/// # Errors
///
/// Unknown ids come back as `BadRequest` carrying the store's error message,
/// which is cleared from the store once reported. A malformed patch is a
/// `SerializationError`.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_record(
    store: *mut StoreHandle,
    kind: *const c_char,
    id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "update_record") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<EntityKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    let json = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let updated = match kind {
        EntityKind::Services => serde_json::from_str::<ServicePatch>(&json).map(|p| store.update_service(&id, p)),
        EntityKind::Resources => serde_json::from_str::<ResourcePatch>(&json).map(|p| store.update_resource(&id, p)),
        EntityKind::Alerts => serde_json::from_str::<AlertPatch>(&json).map(|p| store.update_alert(&id, p)),
        EntityKind::Events => serde_json::from_str::<EventPatch>(&json).map(|p| store.update_event(&id, p)),
    };

    match updated {
        Ok(()) => finish_mutation(store, format!("Updated {id}")),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid {kind} patch: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Removes a record. Removing an unknown id still succeeds.
///
/// # Returns
///
/// A JSON `AppResponse` C string; release it with [`free_c_string`].
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn remove_record(
    store: *mut StoreHandle,
    kind: *const c_char,
    id: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "remove_record") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<EntityKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    match kind {
        EntityKind::Services => store.remove_service(&id),
        EntityKind::Resources => store.remove_resource(&id),
        EntityKind::Alerts => store.remove_alert(&id),
        EntityKind::Events => store.remove_event(&id),
    }
    finish_mutation(store, format!("Removed {id}"))
}

/// Sets or clears the user location.
///
/// # Parameters
///
/// * `store` - Store pointer
/// * `json_ptr` - Location JSON (`{"city":..,"state":..,"zipCode":..,"coordinates":{"lat":..,"lng":..}}`),
///   or null / `"null"` to clear it
///
/// # Returns
///
/// A JSON `AppResponse` C string; release it with [`free_c_string`].
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_user_location(store: *mut StoreHandle, json_ptr: *const c_char) -> *const c_char {
    let store = match store_mut(store, "set_user_location") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let location = match optional_json::<Option<UserLocation>>(json_ptr) {
        Ok(location) => location,
        Err(error_ptr) => return error_ptr,
    };

    store.set_user_location(location);
    finish_mutation(store, "Location updated".to_string())
}

/// Services near the user.
///
/// # Parameters
///
/// * `store` - Store pointer
/// * `radius_miles` - Search radius; a negative value means the default of
///   50 miles
///
/// # Returns
///
/// `Ok` with a JSON array. Without user coordinates every service is
/// returned.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn nearby_services(store: *mut StoreHandle, radius_miles: f64) -> *const c_char {
    let store = match store_ref(store, "nearby_services") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let radius = (radius_miles >= 0.0).then_some(radius_miles);
    ok_json(&store.get_nearby_services(radius))
}

/// Adds (`on = true`) or removes a favorite.
///
/// # Returns
///
/// `Ok("true")` or `Ok("false")`: whether the id is a favorite afterwards.
/// `BadRequest` for `"alerts"`, which cannot be favorited.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn toggle_favorite(
    store: *mut StoreHandle,
    kind: *const c_char,
    id: *const c_char,
    on: bool,
) -> *const c_char {
    let store = match store_mut(store, "toggle_favorite") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<FavoriteKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    if on {
        store.add_to_favorites(kind, &id);
    } else {
        store.remove_from_favorites(kind, &id);
    }
    ok_json(&store.is_favorite(kind, &id))
}

/// Responds `Ok("true")` or `Ok("false")`.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn is_favorite(
    store: *mut StoreHandle,
    kind: *const c_char,
    id: *const c_char,
) -> *const c_char {
    let store = match store_ref(store, "is_favorite") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<FavoriteKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };
    ok_json(&store.is_favorite(kind, &id))
}

/// Exports a collection as `"json"` or `"csv"`.
///
/// # Returns
///
/// `Ok` whose payload is the raw exported text. An empty collection exports
/// as `""` in CSV.
///
/// # Errors
///
/// `BadRequest` for unknown kinds or formats.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_data(
    store: *mut StoreHandle,
    kind: *const c_char,
    format: *const c_char,
) -> *const c_char {
    let store = match store_ref(store, "export_data") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<EntityKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let format = match parse_c_str::<ExportFormat>(format, "format") {
        Ok(format) => format,
        Err(error_ptr) => return error_ptr,
    };

    match store.export_data(kind, format) {
        Ok(data) => response_to_c_string(&AppResponse::Ok(data)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Imports `data` into a collection, one new record per row.
///
/// # Returns
///
/// `Ok` when every row was added.
///
/// # Errors
///
/// `BadRequest` with the store's message when the input cannot be parsed or
/// some rows could not be added; the good rows are in by then.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn import_data(
    store: *mut StoreHandle,
    kind: *const c_char,
    data: *const c_char,
    format: *const c_char,
) -> *const c_char {
    let store = match store_mut(store, "import_data") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let kind = match parse_c_str::<EntityKind>(kind, "kind") {
        Ok(kind) => kind,
        Err(error_ptr) => return error_ptr,
    };
    let data = match c_ptr_to_string(data, "data") {
        Ok(data) => data,
        Err(error_ptr) => return error_ptr,
    };
    let format = match parse_c_str::<ExportFormat>(format, "format") {
        Ok(format) => format,
        Err(error_ptr) => return error_ptr,
    };

    store.import_data(kind, &data, format);
    finish_mutation(store, format!("Imported {kind}"))
}

/// Deletes every persisted key (settings, favorites, location).
///
/// The in-memory state is left as it is; the next change to one of those
/// slices writes it again.
///
/// # Returns
///
/// A JSON `AppResponse` C string; release it with [`free_c_string`].
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_all_records(store: *mut StoreHandle) -> *const c_char {
    let store = match store_ref(store, "clear_all_records") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    match store.storage().clear_all_records() {
        Ok(()) => response_to_c_string(&AppResponse::success("All records cleared successfully")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Moves the store onto an empty database named `name_ptr`.
///
/// The old database directory is removed (or cleared, if the name is the
/// same) and the whole state returns to its initial value.
///
/// # Returns
///
/// `Ok` on success, `DatabaseError` if the new environment cannot be opened.
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_database(store: *mut StoreHandle, name_ptr: *const c_char) -> *const c_char {
    let store = match store_mut(store, "reset_database") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };
    let name = match c_ptr_to_string(name_ptr, "name") {
        Ok(name) => name,
        Err(error_ptr) => return error_ptr,
    };

    match store.reset_database(&name) {
        Ok(()) => response_to_c_string(&AppResponse::Ok(format!("Database '{name}' was reset successfully"))),
        Err(e) => {
            let error = AppResponse::DatabaseError(format!("Error resetting database: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Flushes the database to disk ahead of shutdown or a hot restart.
///
/// The store pointer is still owned by the caller and must be released with
/// [`close_store`].
///
/// # Returns
///
/// A JSON `AppResponse` C string; release it with [`free_c_string`].
///
/// # Safety
///
/// `store` must be null or a live pointer from [`create_store`]. String
/// arguments must be null or NUL-terminated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_database(store: *mut StoreHandle) -> *const c_char {
    let store = match store_ref(store, "close_database") {
        Ok(store) => store,
        Err(error_ptr) => return error_ptr,
    };

    match store.storage().close_database() {
        Ok(()) => response_to_c_string(&AppResponse::success("Database connection closed successfully")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Releases a string returned by any function of this library.
///
/// # Safety
///
/// `ptr` must be null or a string returned by this library that has not been
/// freed yet.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_c_string(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// Reports a mutation: the store's error if one was recorded (and clears it),
/// otherwise `Ok(message)`.
fn finish_mutation(store: &mut StoreHandle, message: String) -> *const c_char {
    match store.state().error.clone() {
        Some(error) => {
            store.clear_error();
            response_to_c_string(&AppResponse::BadRequest(error))
        }
        None => response_to_c_string(&AppResponse::Ok(message)),
    }
}

fn store_ref<'a>(store: *mut StoreHandle, operation: &str) -> Result<&'a StoreHandle, *const c_char> {
    match unsafe { store.as_ref() } {
        Some(store) => Ok(store),
        None => {
            let error = AppResponse::BadRequest(format!("Null store pointer passed to {operation}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn store_mut<'a>(store: *mut StoreHandle, operation: &str) -> Result<&'a mut StoreHandle, *const c_char> {
    match unsafe { store.as_mut() } {
        Some(store) => Ok(store),
        None => {
            let error = AppResponse::BadRequest(format!("Null store pointer passed to {operation}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn parse_c_str<T>(ptr: *const c_char, field_name: &str) -> Result<T, *const c_char>
where
    T: std::str::FromStr<Err = StoreError>,
{
    let text = c_ptr_to_string(ptr, field_name)?;
    text.parse::<T>()
        .map_err(|e| response_to_c_string(&AppResponse::from(e)))
}

/// Null pointer means `T::default()`.
fn optional_json<T: DeserializeOwned + Default>(ptr: *const c_char) -> Result<T, *const c_char> {
    if ptr.is_null() {
        return Ok(T::default());
    }
    let json = c_ptr_to_string(ptr, "JSON")?;
    serde_json::from_str(&json).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

fn ok_json<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Serializes the response to JSON and hands it out as a C string.
/// Returns null if either step fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// # Returns
///
/// * `Ok(String)` - If conversion was successful
/// * `Err(*const c_char)` - A `BadRequest` response for null pointers or
///   invalid UTF-8
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
