//! Build-time settings, read with `option_env!` when the wasm bundle is
//! compiled.

/// Socket endpoint for live updates. Unset disables the socket.
pub fn socket_url() -> Option<&'static str> {
    non_empty(option_env!("PEACEBOARD_SOCKET_URL"))
}

/// API origin. Unset means same origin as the page.
pub fn api_origin() -> Option<&'static str> {
    non_empty(option_env!("PEACEBOARD_API_ORIGIN"))
}

fn non_empty(value: Option<&'static str>) -> Option<&'static str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_unset() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" wss://live.example ")), Some("wss://live.example"));
    }
}
