use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockdash_core::DomainError;

/// The user's stored display-mode choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayPreference {
    /// Follow the system signal.
    #[default]
    System,
    Light,
    Dark,
}

impl DisplayPreference {
    /// Rotation order used by [`next`](Self::next).
    pub const CYCLE: [DisplayPreference; 3] = [
        DisplayPreference::System,
        DisplayPreference::Light,
        DisplayPreference::Dark,
    ];

    /// Storage literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayPreference::System => "system",
            DisplayPreference::Light => "light",
            DisplayPreference::Dark => "dark",
        }
    }

    /// Tooltip text for the mode toggle.
    pub fn label(&self) -> &'static str {
        match self {
            DisplayPreference::System => "System mode",
            DisplayPreference::Light => "Light mode",
            DisplayPreference::Dark => "Dark mode",
        }
    }

    /// `system → light → dark → system`.
    pub fn next(self) -> Self {
        match self {
            DisplayPreference::System => DisplayPreference::Light,
            DisplayPreference::Light => DisplayPreference::Dark,
            DisplayPreference::Dark => DisplayPreference::System,
        }
    }

    /// The mode to render with, given the current system signal.
    pub fn resolve(self, system_signal: EffectiveMode) -> EffectiveMode {
        match self {
            DisplayPreference::System => system_signal,
            DisplayPreference::Light => EffectiveMode::Light,
            DisplayPreference::Dark => EffectiveMode::Dark,
        }
    }
}

impl core::fmt::Display for DisplayPreference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the three storage literals.
impl FromStr for DisplayPreference {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(DisplayPreference::System),
            "light" => Ok(DisplayPreference::Light),
            "dark" => Ok(DisplayPreference::Dark),
            other => Err(DomainError::invalid_preference(other)),
        }
    }
}

impl From<EffectiveMode> for DisplayPreference {
    fn from(mode: EffectiveMode) -> Self {
        match mode {
            EffectiveMode::Light => DisplayPreference::Light,
            EffectiveMode::Dark => DisplayPreference::Dark,
        }
    }
}

/// The binary mode actually applied to presentation. Never "system".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveMode {
    Light,
    Dark,
}

impl EffectiveMode {
    pub fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            EffectiveMode::Dark
        } else {
            EffectiveMode::Light
        }
    }

    pub fn is_dark(self) -> bool {
        self == EffectiveMode::Dark
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveMode::Light => "light",
            EffectiveMode::Dark => "dark",
        }
    }
}

impl core::fmt::Display for EffectiveMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
