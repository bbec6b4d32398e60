//! Live UI state fed by the socket channel.
//!
//! Handlers only ever overwrite or merge: there is no acknowledgement, replay
//! or ordering beyond arrival order.
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::models::{Feature, FeatureCollection, PeaceMap};
use crate::peace;

/// Magnitude used for heat entries that carry no usable count.
const DEFAULT_MAGNITUDE: f64 = 1.0;
const MAX_MAGNITUDE: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub region: String,
    pub country_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapEntry {
    pub country_code: String,
    pub region: String,
    pub city: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HeatmapEntry {
    fn same_place(&self, other: &HeatmapEntry) -> bool {
        self.country_code == other.country_code
            && self.region == other.region
            && self.city == other.city
    }

    /// Point feature for the heatmap layer, or `None` without coordinates.
    pub fn to_feature(&self) -> Option<Feature> {
        let (lat, lng) = (self.latitude?, self.longitude?);
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        let mag = match self.count {
            Some(c) if c.is_finite() && c >= 0.0 => c.min(MAX_MAGNITUDE),
            _ => DEFAULT_MAGNITUDE,
        };
        let mut props = Map::new();
        props.insert("city".into(), json!(self.city));
        props.insert("region".into(), json!(self.region));
        props.insert("countryCode".into(), json!(self.country_code));
        props.insert("mag".into(), json!(mag));
        Some(Feature::point(lng, lat, props))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveUsers {
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignForPeace {
    #[serde(default)]
    pub map_data: Option<PeaceMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerNotice {
    pub message: String,
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// Inbound frames: `{"event": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum SocketEvent {
    ActiveUsersUpdate(ActiveUsers),
    PeaceMapUpdate(PeaceMap),
    HeatmapSnapshotUpdate(Vec<HeatmapEntry>),
    HeatmapSnapshotDiffUpdate(Vec<HeatmapEntry>),
    SignForPeace(SignForPeace),
    SignForPeaceAck(Value),
    ValidationError(ServerNotice),
    RateLimit(ServerNotice),
}

impl SocketEvent {
    pub fn decode(frame: &str) -> Result<SocketEvent, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

/// Outbound `signForPeace` frame.
pub fn sign_for_peace_frame(signature: &Value) -> String {
    json!({ "event": "signForPeace", "data": signature }).to_string()
}

/// Which slice of the store an event touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    None,
    Counters,
    Heatmap,
    PeaceMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeaceStore {
    pub active_users: u64,
    pub total_pledges: u64,
    pub heatmap: Vec<HeatmapEntry>,
    pub peace_map: PeaceMap,
    pub user_location: Option<UserLocation>,
    pub countries_count: usize,
}

impl PeaceStore {
    pub fn set_active_users(&mut self, count: u64) {
        self.active_users = count;
    }

    pub fn record_pledge(&mut self) {
        self.total_pledges += 1;
    }

    pub fn set_peace_map(&mut self, map: PeaceMap) {
        self.countries_count = peace::supporting_countries(&map);
        self.peace_map = map;
    }

    pub fn replace_heatmap(&mut self, entries: Vec<HeatmapEntry>) {
        self.heatmap = entries;
    }

    /// Replace entries for the same (country, region, city), append the rest.
    pub fn merge_heatmap(&mut self, entries: Vec<HeatmapEntry>) {
        for entry in entries {
            match self.heatmap.iter_mut().find(|e| e.same_place(&entry)) {
                Some(existing) => *existing = entry,
                None => self.heatmap.push(entry),
            }
        }
    }

    pub fn set_user_location(&mut self, location: UserLocation) {
        self.user_location = Some(location);
    }

    pub fn heat_features(&self) -> FeatureCollection {
        FeatureCollection::new(self.heatmap.iter().filter_map(HeatmapEntry::to_feature).collect())
    }

    pub fn apply(&mut self, event: SocketEvent) -> StoreChange {
        match event {
            SocketEvent::ActiveUsersUpdate(ActiveUsers { count }) => {
                self.set_active_users(count);
                StoreChange::Counters
            }
            SocketEvent::PeaceMapUpdate(map) => {
                self.set_peace_map(map);
                StoreChange::PeaceMap
            }
            SocketEvent::HeatmapSnapshotUpdate(entries) => {
                self.replace_heatmap(entries);
                StoreChange::Heatmap
            }
            SocketEvent::HeatmapSnapshotDiffUpdate(entries) => {
                self.merge_heatmap(entries);
                StoreChange::Heatmap
            }
            SocketEvent::SignForPeace(SignForPeace { map_data }) => {
                self.record_pledge();
                match map_data {
                    Some(map) => {
                        self.set_peace_map(map);
                        StoreChange::PeaceMap
                    }
                    None => StoreChange::Counters,
                }
            }
            SocketEvent::SignForPeaceAck(ack) => {
                tracing::info!(%ack, "sign for peace acknowledged");
                StoreChange::None
            }
            SocketEvent::ValidationError(notice) => {
                tracing::error!(message = %notice.message, errors = notice.errors.len(), "validation error");
                StoreChange::None
            }
            SocketEvent::RateLimit(notice) => {
                tracing::warn!(message = %notice.message, "rate limit reached");
                StoreChange::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(city: &str, count: f64) -> HeatmapEntry {
        HeatmapEntry {
            country_code: "NO".into(),
            region: "Vestland".into(),
            city: city.into(),
            latitude: Some(60.39),
            longitude: Some(5.33),
            count: Some(count),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_decode_active_users() {
        let ev = SocketEvent::decode(r#"{"event":"activeUsersUpdate","data":{"count":42}}"#).unwrap();
        assert_eq!(ev, SocketEvent::ActiveUsersUpdate(ActiveUsers { count: 42 }));
    }

    #[test]
    fn test_decode_heatmap_entry_keeps_extra_fields() {
        let ev = SocketEvent::decode(
            r#"{"event":"heatmapSnapshotUpdate","data":[{"countryCode":"NO","region":"Vestland","city":"Bergen","latitude":60.39,"longitude":5.33,"count":3,"source":"web"}]}"#,
        )
        .unwrap();
        match ev {
            SocketEvent::HeatmapSnapshotUpdate(entries) => {
                assert_eq!(entries[0].city, "Bergen");
                assert_eq!(entries[0].extra["source"], "web");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_event_fails() {
        assert!(SocketEvent::decode(r#"{"event":"somethingElse","data":{}}"#).is_err());
    }

    #[test]
    fn test_diff_update_merges_by_place() {
        let mut store = PeaceStore::default();
        store.apply(SocketEvent::HeatmapSnapshotUpdate(vec![entry("Bergen", 1.0), entry("Oslo", 2.0)]));
        let change = store.apply(SocketEvent::HeatmapSnapshotDiffUpdate(vec![
            entry("Bergen", 5.0),
            entry("Voss", 1.0),
        ]));
        assert_eq!(change, StoreChange::Heatmap);
        assert_eq!(store.heatmap.len(), 3);
        assert_eq!(store.heatmap[0].count, Some(5.0));
        assert_eq!(store.heatmap[2].city, "Voss");
    }

    #[test]
    fn test_sign_for_peace_counts_and_replaces_map() {
        let mut store = PeaceStore::default();
        assert_eq!(store.apply(SocketEvent::SignForPeace(SignForPeace::default())), StoreChange::Counters);
        let mut map = PeaceMap::new();
        map.insert("NOR".into(), 12.0);
        map.insert("SWE".into(), 0.0);
        let change = store.apply(SocketEvent::SignForPeace(SignForPeace { map_data: Some(map) }));
        assert_eq!(change, StoreChange::PeaceMap);
        assert_eq!(store.total_pledges, 2);
        assert_eq!(store.countries_count, 1);
    }

    #[test]
    fn test_notices_do_not_touch_state() {
        let mut store = PeaceStore::default();
        let notice = ServerNotice { message: "slow down".into(), errors: vec![] };
        assert_eq!(store.apply(SocketEvent::RateLimit(notice)), StoreChange::None);
        assert_eq!(store, PeaceStore::default());
    }

    #[test]
    fn test_heat_feature_magnitude_falls_back_and_caps() {
        let mut e = entry("Bergen", 40.0);
        assert_eq!(e.to_feature().unwrap().prop_f64("mag"), Some(6.0));
        e.count = None;
        assert_eq!(e.to_feature().unwrap().prop_f64("mag"), Some(1.0));
        e.latitude = None;
        assert!(e.to_feature().is_none());
    }

    #[test]
    fn test_sign_for_peace_frame() {
        let frame = sign_for_peace_frame(&json!({"country": "NO"}));
        let v: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(v["event"], "signForPeace");
        assert_eq!(v["data"]["country"], "NO");
    }
}
