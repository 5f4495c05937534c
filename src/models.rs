use crate::errors::AppError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::net::IpAddr;

// ============ Entities ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "IPv4")]
    IPv4,
    #[serde(rename = "IPv6")]
    IPv6,
    #[serde(rename = "other")]
    Other,
}

impl EntityType {
    fn infer(value: &str) -> Self {
        match value.trim().parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => EntityType::IPv4,
            Ok(IpAddr::V6(_)) => EntityType::IPv6,
            Err(_) => EntityType::Other,
        }
    }
}

/// An indicator submitted for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EntityInput")]
pub struct Entity {
    pub value: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl Entity {
    /// Creates an entity, inferring its type from the value.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let entity_type = EntityType::infer(&value);
        Self { value, entity_type }
    }
}

#[derive(Deserialize)]
struct EntityInput {
    value: String,
    #[serde(rename = "type")]
    entity_type: Option<EntityType>,
}

impl From<EntityInput> for Entity {
    fn from(input: EntityInput) -> Self {
        let entity_type = input
            .entity_type
            .unwrap_or_else(|| EntityType::infer(&input.value));
        Self {
            value: input.value,
            entity_type,
        }
    }
}

// ============ Options ============

/// Per-lookup configuration bag.
///
/// Deserializes from flat strings (`{"host": "https://..."}`) and from the
/// host's wrapped shape (`{"host": {"value": "https://..."}}`). A wrapped
/// value that is not a string is treated as missing.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LookupOptions {
    #[serde(default, deserialize_with = "option_field")]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "option_field")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "option_field")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "option_field")]
    pub tenant: Option<String>,
    /// A present token selects static-token authentication.
    #[serde(default, deserialize_with = "option_field")]
    pub token: Option<String>,
}

impl fmt::Debug for LookupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("LookupOptions")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("tenant", &self.tenant)
            .field("token", &redact(&self.token))
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionField {
    Plain(Option<String>),
    Wrapped { value: Option<Value> },
}

fn option_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OptionField::deserialize(deserializer)? {
        OptionField::Plain(value) => value,
        OptionField::Wrapped {
            value: Some(Value::String(s)),
        } => Some(s),
        OptionField::Wrapped { .. } => None,
    })
}

// ============ Results ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupData {
    /// Reserved for a presentation layer; always empty here.
    pub summary: Vec<String>,
    /// One map per matched event.
    pub details: Vec<Map<String, Value>>,
}

/// Outcome for one entity. `data` is `None` when the index had no match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub entity: Entity,
    pub data: Option<LookupData>,
}

// ============ Search response ============

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchEntry {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Deserialize)]
struct EventEntries {
    entry: Vec<SearchEntry>,
}

// Two event shapes are seen in the wild: entries nested under `result`, or
// directly on the event.
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchEvent {
    Nested { result: EventEntries },
    Flat(EventEntries),
}

impl SearchEvent {
    fn into_entries(self) -> Vec<SearchEntry> {
        match self {
            SearchEvent::Nested { result } => result.entry,
            SearchEvent::Flat(entries) => entries.entry,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventsPayload {
    Many(Vec<SearchEvent>),
    One(SearchEvent),
}

impl EventsPayload {
    fn into_events(self) -> Vec<SearchEvent> {
        match self {
            EventsPayload::Many(events) => events,
            EventsPayload::One(event) => vec![event],
        }
    }
}

/// Folds `{key, value}` pairs into a map. Later duplicates overwrite earlier ones.
pub fn fold_entries(entries: Vec<SearchEntry>) -> Map<String, Value> {
    entries.into_iter().fold(Map::new(), |mut acc, entry| {
        acc.insert(entry.key, entry.value);
        acc
    })
}

// `null`, `false`, `0` and `""` all mean "no events".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Turns a raw search response body into lookup data.
///
/// A missing, falsy (`null`, `false`, `0`, `""`) or empty `events` field is
/// a no-match (`Ok(None)`), not an error. An `events` field of any other
/// unrecognised shape is an error.
pub fn normalize_search_body(body: &Value) -> Result<Option<LookupData>, AppError> {
    let events = match body.get("events") {
        None => return Ok(None),
        Some(events) if is_falsy(events) => return Ok(None),
        Some(events) => events,
    };

    let payload: EventsPayload = serde_json::from_value(events.clone()).map_err(|e| {
        AppError::InvalidResponse(format!("unrecognised events payload: {}", e))
    })?;

    let details: Vec<Map<String, Value>> = payload
        .into_events()
        .into_iter()
        .map(|event| fold_entries(event.into_entries()))
        .collect();

    if details.is_empty() {
        return Ok(None);
    }

    Ok(Some(LookupData {
        summary: Vec::new(),
        details,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_type_inference() {
        assert_eq!(Entity::new("10.0.0.1").entity_type, EntityType::IPv4);
        assert_eq!(Entity::new("fe80::1").entity_type, EntityType::IPv6);
        assert_eq!(Entity::new("example.com").entity_type, EntityType::Other);
    }

    #[test]
    fn test_entity_deserialize_infers_missing_type() {
        let entity: Entity = serde_json::from_value(json!({"value": "192.168.1.10"})).unwrap();
        assert_eq!(entity.entity_type, EntityType::IPv4);

        let entity: Entity =
            serde_json::from_value(json!({"value": "10.0.0.1", "type": "other"})).unwrap();
        assert_eq!(entity.entity_type, EntityType::Other);
    }

    #[test]
    fn test_options_accept_wrapped_and_flat_shapes() {
        let wrapped: LookupOptions = serde_json::from_value(json!({
            "host": {"value": "https://siem.example.com"},
            "token": {"value": "abc"},
            "tenant": {"value": 42}
        }))
        .unwrap();
        assert_eq!(wrapped.host.as_deref(), Some("https://siem.example.com"));
        assert_eq!(wrapped.token.as_deref(), Some("abc"));
        assert_eq!(wrapped.tenant, None);

        let flat: LookupOptions =
            serde_json::from_value(json!({"host": "https://siem.example.com", "username": null}))
                .unwrap();
        assert_eq!(flat.host.as_deref(), Some("https://siem.example.com"));
        assert_eq!(flat.username, None);
    }

    #[test]
    fn test_options_debug_redacts_secrets() {
        let options = LookupOptions {
            password: Some("hunter2".to_string()),
            token: Some("tok-123".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", options);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("tok-123"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_missing_events_is_no_match() {
        assert_eq!(normalize_search_body(&json!({"status": "ok"})).unwrap(), None);
        assert_eq!(normalize_search_body(&json!({"events": null})).unwrap(), None);
        assert_eq!(normalize_search_body(&json!({"events": []})).unwrap(), None);
        assert_eq!(normalize_search_body(&json!("plain text")).unwrap(), None);
    }

    #[test]
    fn test_falsy_scalar_events_are_no_match() {
        for events in [json!(false), json!(0), json!(0.0), json!("")] {
            assert_eq!(
                normalize_search_body(&json!({"events": events.clone()})).unwrap(),
                None,
                "events = {}",
                events
            );
        }
        assert!(normalize_search_body(&json!({"events": true})).is_err());
        assert!(normalize_search_body(&json!({"events": "x"})).is_err());
    }

    #[test]
    fn test_single_nested_event() {
        let body = json!({
            "events": {"result": {"entry": [{"key": "ip", "value": "10.0.0.1"}]}}
        });
        let data = normalize_search_body(&body).unwrap().unwrap();

        assert!(data.summary.is_empty());
        assert_eq!(data.details.len(), 1);
        assert_eq!(data.details[0]["ip"], "10.0.0.1");
    }

    #[test]
    fn test_event_list_with_flat_entries() {
        let body = json!({
            "events": [
                {"entry": [{"key": "ip", "value": "10.0.0.1"}, {"key": "owner", "value": "ops"}]},
                {"result": {"entry": [{"key": "ip", "value": "10.0.0.1"}, {"key": "port", "value": 22}]}}
            ]
        });
        let data = normalize_search_body(&body).unwrap().unwrap();

        assert_eq!(data.details.len(), 2);
        assert_eq!(data.details[0]["owner"], "ops");
        assert_eq!(data.details[1]["port"], 22);
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let entries = vec![
            SearchEntry {
                key: "os".to_string(),
                value: json!("linux"),
            },
            SearchEntry {
                key: "os".to_string(),
                value: json!("windows"),
            },
        ];
        let folded = fold_entries(entries);
        assert_eq!(folded.len(), 1);
        assert_eq!(folded["os"], "windows");
    }

    #[test]
    fn test_unrecognised_events_shape_is_error() {
        let err = normalize_search_body(&json!({"events": {"unexpected": true}})).unwrap_err();
        assert!(matches!(err, AppError::InvalidResponse(_)));
    }

    #[test]
    fn test_lookup_result_serializes_null_data() {
        let result = LookupResult {
            entity: Entity::new("10.0.0.1"),
            data: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["data"], Value::Null);
        assert_eq!(json["entity"]["type"], "IPv4");
    }
}
