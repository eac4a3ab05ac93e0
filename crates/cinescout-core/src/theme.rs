use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;
use tracing::debug;

/// Env var that forces the color scheme, e.g. `CINESCOUT_COLOR_SCHEME=light`
pub const COLOR_SCHEME_ENV: &str = "CINESCOUT_COLOR_SCHEME";

/// Light or dark - that's the whole choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    #[default]
    Dark,
}

impl ThemePreference {
    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    /// Resolve a host-reported scheme; anything unrecognized means dark
    pub fn from_host(scheme: Option<&str>) -> Self {
        scheme
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn palette(self) -> Palette {
        match self {
            ThemePreference::Light => Palette::light(),
            ThemePreference::Dark => Palette::dark(),
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemePreference::Light => write!(f, "light"),
            ThemePreference::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            other => Err(format!("unknown color scheme: {}", other)),
        }
    }
}

/// Ask the host what it prefers
///
/// An explicit `CINESCOUT_COLOR_SCHEME` wins. Otherwise we read the
/// terminal's `COLORFGBG` ("fg;bg"), where a background of 7 or 15 means a
/// light terminal.
pub fn host_color_scheme() -> Option<String> {
    if let Ok(scheme) = std::env::var(COLOR_SCHEME_ENV) {
        return Some(scheme);
    }

    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| scheme_from_colorfgbg(&value))
        .map(|pref| pref.to_string())
}

fn scheme_from_colorfgbg(value: &str) -> Option<ThemePreference> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;

    Some(match background {
        7 | 15 => ThemePreference::Light,
        _ => ThemePreference::Dark,
    })
}

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Colors a front end needs to draw the app in a given theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub foreground: Color,
    pub muted: Color,
    pub border: Color,
    /// Heart icon, same in both themes
    pub favorite: Color,
}

impl Palette {
    pub const fn dark() -> Self {
        Self {
            background: Color::rgb(0x121212),
            surface: Color::rgb(0x1e1e1e),
            foreground: Color::rgb(0xffffff),
            muted: Color::rgb(0xaaaaaa),
            border: Color::rgb(0x333333),
            favorite: Color::rgb(0xef4444),
        }
    }

    pub const fn light() -> Self {
        Self {
            background: Color::rgb(0xffffff),
            surface: Color::rgb(0xf5f5f5),
            foreground: Color::rgb(0x000000),
            muted: Color::rgb(0x666666),
            border: Color::rgb(0xe0e0e0),
            favorite: Color::rgb(0xef4444),
        }
    }
}

/// Holds the current theme for everyone who cares
///
/// In memory only; a fresh process probes the host again.
pub struct ThemeStore {
    state: watch::Sender<ThemePreference>,
}

impl ThemeStore {
    pub fn new(host_scheme: Option<&str>) -> Self {
        let initial = ThemePreference::from_host(host_scheme);
        debug!("Starting with {} theme", initial);

        let (state, _) = watch::channel(initial);
        Self { state }
    }

    /// Probe the environment, falling back to `configured` and then dark
    pub fn detect(configured: Option<&str>) -> Self {
        let host = host_color_scheme();
        Self::new(host.as_deref().or(configured))
    }

    pub fn current(&self) -> ThemePreference {
        *self.state.borrow()
    }

    /// Flip light/dark and return the new value
    pub fn toggle_theme(&self) -> ThemePreference {
        self.state.send_modify(|pref| *pref = pref.toggled());
        let now = self.current();
        debug!("Theme switched to {}", now);
        now
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemePreference> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_host_scheme_is_used() {
        assert_eq!(ThemeStore::new(Some("light")).current(), ThemePreference::Light);
        assert_eq!(ThemeStore::new(Some("DARK")).current(), ThemePreference::Dark);
    }

    #[test]
    fn test_unknown_or_missing_scheme_defaults_to_dark() {
        assert_eq!(ThemeStore::new(None).current(), ThemePreference::Dark);
        assert_eq!(ThemeStore::new(Some("no-preference")).current(), ThemePreference::Dark);
    }

    #[test]
    fn test_toggle_twice_restores_original() {
        for start in ["light", "dark"] {
            let store = ThemeStore::new(Some(start));
            let original = store.current();

            let flipped = store.toggle_theme();
            assert_ne!(flipped, original);
            assert_eq!(store.toggle_theme(), original);
        }
    }

    #[test]
    fn test_subscribers_see_toggle_immediately() {
        let store = ThemeStore::new(Some("dark"));
        let mut rx = store.subscribe();

        store.toggle_theme();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ThemePreference::Light);
    }

    #[test]
    fn test_colorfgbg_parsing() {
        assert_eq!(scheme_from_colorfgbg("0;15"), Some(ThemePreference::Light));
        assert_eq!(scheme_from_colorfgbg("15;0"), Some(ThemePreference::Dark));
        assert_eq!(scheme_from_colorfgbg("12;default;7"), Some(ThemePreference::Light));
        assert_eq!(scheme_from_colorfgbg("garbage"), None);
    }

    #[test]
    fn test_palettes_differ_but_share_favorite_color() {
        let dark = ThemePreference::Dark.palette();
        let light = ThemePreference::Light.palette();

        assert_eq!(dark.background.hex(), "#121212");
        assert_eq!(light.background.hex(), "#FFFFFF");
        assert_eq!(dark.favorite, light.favorite);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ThemePreference::Light).unwrap();
        assert_eq!(json, "\"light\"");
    }
}
