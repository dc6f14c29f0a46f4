//! Push-channel messages.
//!
//! Frames are JSON text: `{"event": "<name>", "data": {...}}`.
//!
//! server -> client: `initialData` once per connection, `priceUpdate` on every
//! publish. client -> server: `subscribe` (advisory city scoping) and
//! `requestUpdate` (resend the latest snapshot to this subscriber unless it
//! already has it).

use serde::{Deserialize, Serialize};

use crate::cities::City;
use crate::types::PriceSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    InitialData(InitialData),
    PriceUpdate(PriceSnapshot),
}

/// Payload of `initialData`: the city list plus a full snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialData {
    pub cities: Vec<City>,
    #[serde(flatten)]
    pub snapshot: PriceSnapshot,
}

impl ServerEvent {
    pub fn initial(cities: Vec<City>, snapshot: PriceSnapshot) -> Self {
        ServerEvent::InitialData(InitialData { cities, snapshot })
    }

    pub fn snapshot(&self) -> &PriceSnapshot {
        match self {
            ServerEvent::InitialData(data) => &data.snapshot,
            ServerEvent::PriceUpdate(snapshot) => snapshot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Subscribe {
        #[serde(rename = "cityIds", default)]
        city_ids: Vec<String>,
    },
    RequestUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_update_wire_shape() {
        let event = ServerEvent::PriceUpdate(PriceSnapshot {
            updated_ms: 5,
            prices: Default::default(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({ "event": "priceUpdate", "data": { "updatedMs": 5, "prices": {} } })
        );
    }

    #[test]
    fn initial_data_flattens_snapshot() {
        let event = ServerEvent::initial(Vec::new(), PriceSnapshot::default());
        let text = serde_json::to_string(&event).unwrap();
        assert_eq!(
            text,
            r#"{"event":"initialData","data":{"cities":[],"updatedMs":0,"prices":{}}}"#
        );

        let back: ServerEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn client_events_decode() {
        let sub: ClientEvent =
            serde_json::from_str(r#"{"event":"subscribe","data":{"cityIds":["mumbai"]}}"#).unwrap();
        assert_eq!(
            sub,
            ClientEvent::Subscribe {
                city_ids: vec!["mumbai".into()]
            }
        );

        let req: ClientEvent = serde_json::from_str(r#"{"event":"requestUpdate"}"#).unwrap();
        assert_eq!(req, ClientEvent::RequestUpdate);
    }
}
