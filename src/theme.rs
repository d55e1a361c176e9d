//! Theme preference, persisted across restarts.

use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::storage::kv::{KvStore, THEME_KEY};

/// UI theme (light or dark).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Light appearance.
    #[default]
    Light,
    /// Dark appearance.
    Dark,
}

impl Theme {
    /// Returns true if this is the dark theme.
    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    /// Returns true if this is the light theme.
    pub fn is_light(self) -> bool {
        matches!(self, Self::Light)
    }

    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Read the persisted theme preference; unknown or absent values fall back
/// to the default.
pub async fn load_theme(kv: &dyn KvStore) -> Result<Theme> {
    let stored = kv.get(THEME_KEY).await?;
    Ok(stored
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

/// Persist the theme preference.
pub async fn store_theme(kv: &dyn KvStore, theme: Theme) -> Result<()> {
    kv.set(THEME_KEY, &theme.to_string()).await
}
