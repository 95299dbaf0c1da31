use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target social network for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Instagram,
    Twitter,
    LinkedIn,
}

/// Caption length limits for a platform.
///
/// `generation` bounds what we ask the text model for; `display` is what the
/// platform itself accepts and bounds manual edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformLimits {
    pub generation: usize,
    pub display: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown platform '{0}' (expected instagram, twitter or linkedin)")]
pub struct UnknownPlatform(pub String);

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Instagram, Platform::Twitter, Platform::LinkedIn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::LinkedIn => "linkedin",
        }
    }

    /// Tone requested from the text model.
    pub fn style(&self) -> &'static str {
        match self {
            Platform::Instagram => "creative and engaging",
            Platform::LinkedIn => "professional and informative",
            Platform::Twitter => "concise and witty",
        }
    }

    pub fn limits(&self) -> PlatformLimits {
        match self {
            Platform::Instagram => PlatformLimits {
                generation: 150,
                display: 2200,
            },
            Platform::Twitter => PlatformLimits {
                generation: 280,
                display: 280,
            },
            Platform::LinkedIn => PlatformLimits {
                generation: 200,
                display: 3000,
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "twitter" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::LinkedIn),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}
