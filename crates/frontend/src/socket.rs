//! Live updates over a WebSocket. Frames are decoded into [`SocketEvent`]s
//! and handed to a callback; the socket never reconnects on its own.
use peaceboard_shared::models::Feature;
use peaceboard_shared::store::{self, HeatmapEntry, SocketEvent};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

pub struct LiveSocket {
    socket: WebSocket,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl LiveSocket {
    pub fn connect(url: &str, mut on_event: impl FnMut(SocketEvent) + 'static) -> Result<Self, String> {
        let socket = WebSocket::new(url).map_err(|e| format!("{e:?}"))?;

        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |msg: MessageEvent| {
            let Some(text) = msg.data().as_string() else {
                tracing::debug!("ignoring binary socket frame");
                return;
            };
            match SocketEvent::decode(&text) {
                Ok(event) => on_event(event),
                Err(e) => tracing::warn!(error = %e, "undecodable socket frame"),
            }
        });
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_close = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            tracing::info!(code = event.code(), reason = %event.reason(), "socket closed");
        });
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        tracing::info!(url, "socket connecting");
        Ok(LiveSocket {
            socket,
            _on_message: on_message,
            _on_close: on_close,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.socket.ready_state() == WebSocket::OPEN
    }

    /// Send a pledge. Dropped with a warning unless connected.
    pub fn sign_for_peace(&self, signature: &Value) -> bool {
        if !self.is_connected() {
            tracing::warn!("socket not connected, pledge not sent");
            return false;
        }
        match self.socket.send_with_str(&store::sign_for_peace_frame(signature)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = ?e, "failed to send pledge");
                false
            }
        }
    }
}

impl Drop for LiveSocket {
    fn drop(&mut self) {
        self.socket.set_onmessage(None);
        self.socket.set_onclose(None);
        let _ = self.socket.close();
    }
}

/// Heat points carried by a heatmap event. Entries without coordinates are
/// skipped.
pub fn heat_features(event: &SocketEvent) -> Vec<Feature> {
    match event {
        SocketEvent::HeatmapSnapshotUpdate(entries) | SocketEvent::HeatmapSnapshotDiffUpdate(entries) => {
            entries.iter().filter_map(HeatmapEntry::to_feature).collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_features_from_diff() {
        let event = SocketEvent::decode(
            r#"{"event":"heatmapSnapshotDiffUpdate","data":[
                {"countryCode":"NO","region":"Vestland","city":"Bergen","latitude":60.39,"longitude":5.32,"count":3},
                {"countryCode":"SE","region":"Skane","city":"Lund"}
            ]}"#,
        )
        .unwrap();
        let features = heat_features(&event);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].prop_str("city"), Some("Bergen"));
        assert_eq!(features[0].prop_f64("mag"), Some(3.0));
    }

    #[test]
    fn test_other_events_carry_no_heat() {
        let event = SocketEvent::decode(r#"{"event":"activeUsersUpdate","data":{"count":4}}"#).unwrap();
        assert!(heat_features(&event).is_empty());
    }
}
