//! Camera persistence in `localStorage`.
use peaceboard_shared::models::CameraState;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// The stored camera, or the default when storage is unavailable or any
/// entry is missing or invalid.
pub fn load_camera() -> CameraState {
    match local_storage() {
        Some(storage) => CameraState::from_storage(|key| storage.get_item(key).ok().flatten()),
        None => CameraState::default(),
    }
}

pub fn save_camera(camera: &CameraState) {
    let Some(storage) = local_storage() else {
        return;
    };
    for (key, value) in camera.storage_entries() {
        if let Err(e) = storage.set_item(key, &value) {
            tracing::warn!(key, error = ?e, "failed to persist camera");
            return;
        }
    }
}
