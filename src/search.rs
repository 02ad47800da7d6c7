//! Query and filter predicates over the live collections.
//!
//! Searches are plain reads: O(n) over the collection on every call, nothing
//! cached. The text query is a case-insensitive substring match against a
//! kind-specific set of fields; an empty query matches everything. Filters are
//! ANDed with the query and with each other, and an absent filter is a no-op.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::civic_model::{
    CommunityEvent, Coordinates, EventCategory, FileType, GovernmentResource, ResourceCategory,
    Service, ServiceCategory, ServiceStatus, ServiceType,
};

/// Degrees-to-miles factor of the planar distance approximation.
pub const MILES_PER_DEGREE: f64 = 69.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceFilters {
    #[serde(deserialize_with = "blank_as_none")]
    pub category: Option<ServiceCategory>,
    #[serde(rename = "type", deserialize_with = "blank_as_none")]
    pub kind: Option<ServiceType>,
    /// Case-insensitive substring of the service city.
    pub city: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub status: Option<ServiceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceFilters {
    #[serde(deserialize_with = "blank_as_none")]
    pub category: Option<ResourceCategory>,
    /// Case-insensitive substring of the issuing agency.
    pub agency: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub file_type: Option<FileType>,
    #[serde(deserialize_with = "blank_as_none")]
    pub is_free: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilters {
    #[serde(deserialize_with = "blank_as_none")]
    pub category: Option<EventCategory>,
    /// Case-insensitive substring of the event city.
    pub city: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub is_virtual: Option<bool>,
    #[serde(deserialize_with = "blank_as_none")]
    pub is_public: Option<bool>,
}

/// `""` and `null` both mean "no filter", the way an unselected dropdown
/// arrives from a form.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(value) => T::deserialize(value).map(Some).map_err(serde::de::Error::custom),
    }
}

/// `needle` must already be lowercase.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// An empty substring filter counts as absent.
fn substring_filter(filter: &Option<String>, value: &str) -> bool {
    match filter.as_deref() {
        Some(wanted) if !wanted.is_empty() => contains_folded(value, &wanted.to_lowercase()),
        _ => true,
    }
}

fn exact_filter<T: PartialEq>(filter: &Option<T>, value: &T) -> bool {
    filter.as_ref().map_or(true, |wanted| wanted == value)
}

fn text_matches<'a>(needle: &str, mut fields: impl Iterator<Item = &'a str>) -> bool {
    needle.is_empty() || fields.any(|field| contains_folded(field, needle))
}

impl ServiceFilters {
    pub fn matches(&self, service: &Service) -> bool {
        let details = &service.details;
        exact_filter(&self.category, &details.category)
            && exact_filter(&self.kind, &details.kind)
            && substring_filter(&self.city, &details.location.city)
            && exact_filter(&self.status, &details.status)
    }
}

impl ResourceFilters {
    pub fn matches(&self, resource: &GovernmentResource) -> bool {
        let details = &resource.details;
        exact_filter(&self.category, &details.category)
            && substring_filter(&self.agency, &details.agency)
            && exact_filter(&self.file_type, &details.file_type)
            && exact_filter(&self.is_free, &details.is_free)
    }
}

impl EventFilters {
    pub fn matches(&self, event: &CommunityEvent) -> bool {
        let details = &event.details;
        exact_filter(&self.category, &details.category)
            && substring_filter(&self.city, &details.location.city)
            && exact_filter(&self.is_virtual, &details.is_virtual)
            && exact_filter(&self.is_public, &details.is_public)
    }
}

/// Matches name, description and the services offered.
pub fn search_services<'a>(
    services: &'a [Service],
    query: &str,
    filters: &ServiceFilters,
) -> Vec<&'a Service> {
    let needle = query.to_lowercase();
    services
        .iter()
        .filter(|service| {
            let details = &service.details;
            text_matches(
                &needle,
                [details.name.as_str(), details.description.as_str()]
                    .into_iter()
                    .chain(details.services.iter().map(String::as_str)),
            )
        })
        .filter(|service| filters.matches(service))
        .collect()
}

/// Matches title, description and tags.
pub fn search_resources<'a>(
    resources: &'a [GovernmentResource],
    query: &str,
    filters: &ResourceFilters,
) -> Vec<&'a GovernmentResource> {
    let needle = query.to_lowercase();
    resources
        .iter()
        .filter(|resource| {
            let details = &resource.details;
            text_matches(
                &needle,
                [details.title.as_str(), details.description.as_str()]
                    .into_iter()
                    .chain(details.tags.iter().map(String::as_str)),
            )
        })
        .filter(|resource| filters.matches(resource))
        .collect()
}

/// Matches title, description and tags.
pub fn search_events<'a>(
    events: &'a [CommunityEvent],
    query: &str,
    filters: &EventFilters,
) -> Vec<&'a CommunityEvent> {
    let needle = query.to_lowercase();
    events
        .iter()
        .filter(|event| {
            let details = &event.details;
            text_matches(
                &needle,
                [details.title.as_str(), details.description.as_str()]
                    .into_iter()
                    .chain(details.tags.iter().map(String::as_str)),
            )
        })
        .filter(|event| filters.matches(event))
        .collect()
}

/// Euclidean distance between two coordinate pairs, scaled by
/// [`MILES_PER_DEGREE`]. Not geodesic: longitude degrees are treated as if
/// they were as long as latitude degrees.
pub fn planar_distance_miles(from: Coordinates, to: Coordinates) -> f64 {
    (to.lat - from.lat).hypot(to.lng - from.lng) * MILES_PER_DEGREE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_distance_uses_sixty_nine_miles_per_degree() {
        let a = Coordinates { lat: 40.0, lng: -90.0 };
        let b = Coordinates { lat: 41.0, lng: -90.0 };
        assert!((planar_distance_miles(a, b) - 69.0).abs() < 1e-9);

        let c = Coordinates { lat: 43.0, lng: -86.0 };
        // 3-4-5 triangle in degrees
        assert!((planar_distance_miles(a, c) - 5.0 * 69.0).abs() < 1e-9);
    }

    #[test]
    fn empty_substring_filter_is_ignored() {
        assert!(substring_filter(&Some(String::new()), "Springfield"));
        assert!(substring_filter(&None, "Springfield"));
        assert!(substring_filter(&Some("SPRING".to_string()), "Springfield"));
        assert!(!substring_filter(&Some("shelby".to_string()), "Springfield"));
    }

    #[test]
    fn filters_deserialize_from_camel_case() {
        let filters: ServiceFilters =
            serde_json::from_str(r#"{"type":"nonprofit","city":"spring"}"#).unwrap();
        assert_eq!(filters.kind, Some(ServiceType::Nonprofit));
        assert_eq!(filters.city.as_deref(), Some("spring"));
        assert!(filters.category.is_none());

        let filters: EventFilters = serde_json::from_str(r#"{"isVirtual":false}"#).unwrap();
        assert_eq!(filters.is_virtual, Some(false));
    }

    #[test]
    fn blank_filter_values_are_absent() {
        let filters: ServiceFilters =
            serde_json::from_str(r#"{"category":"","type":"","status":null,"city":""}"#).unwrap();
        assert!(filters.category.is_none());
        assert!(filters.kind.is_none());
        assert!(filters.status.is_none());

        let filters: ResourceFilters =
            serde_json::from_str(r#"{"category":"","fileType":"","isFree":""}"#).unwrap();
        assert_eq!(filters, ResourceFilters::default());

        let filters: EventFilters =
            serde_json::from_str(r#"{"category":"","isVirtual":"","isPublic":true}"#).unwrap();
        assert!(filters.category.is_none());
        assert!(filters.is_virtual.is_none());
        assert_eq!(filters.is_public, Some(true));

        assert!(serde_json::from_str::<ServiceFilters>(r#"{"category":"bakery"}"#).is_err());
    }
}
