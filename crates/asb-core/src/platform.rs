//! Cosmetic platform detection for shortcut labels.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Other,
}

/// `ASB_PLATFORM` overrides the compile-time default so display variants
/// can be exercised anywhere.
pub fn detect() -> Platform {
    match std::env::var("ASB_PLATFORM").ok().as_deref() {
        Some("macos") | Some("darwin") => return Platform::MacOs,
        Some(_) => return Platform::Other,
        None => {}
    }
    default_platform()
}

#[cfg(target_os = "macos")]
fn default_platform() -> Platform {
    Platform::MacOs
}

#[cfg(not(target_os = "macos"))]
fn default_platform() -> Platform {
    Platform::Other
}

pub fn palette_shortcut_label(platform: Platform) -> &'static str {
    match platform {
        Platform::MacOs => "\u{2318}K",
        Platform::Other => "Ctrl+K",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcut_label_tracks_platform() {
        assert_eq!(palette_shortcut_label(Platform::MacOs), "\u{2318}K");
        assert_eq!(palette_shortcut_label(Platform::Other), "Ctrl+K");
    }
}
