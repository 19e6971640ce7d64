//! Page heroes, discriminated by their `type` field.

use std::fmt;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::blocks::Block;
use super::document::MediaRef;
use super::link::LinkRow;
use super::rich_text::RichText;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeroKind {
    HighImpact,
    MediumImpact,
    LowImpact,
    Home,
    About,
    Post,
}

impl HeroKind {
    pub const ALL: [HeroKind; 6] = [
        HeroKind::HighImpact,
        HeroKind::MediumImpact,
        HeroKind::LowImpact,
        HeroKind::Home,
        HeroKind::About,
        HeroKind::Post,
    ];

    pub fn discriminator(self) -> &'static str {
        match self {
            HeroKind::HighImpact => "highImpact",
            HeroKind::MediumImpact => "mediumImpact",
            HeroKind::LowImpact => "lowImpact",
            HeroKind::Home => "homeHero",
            HeroKind::About => "aboutHero",
            HeroKind::Post => "postHero",
        }
    }

    pub fn from_discriminator(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.discriminator() == value)
    }
}

impl fmt::Display for HeroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Hero {
    /// Explicitly no hero.
    None,
    HighImpact(ImpactHero),
    MediumImpact(ImpactHero),
    LowImpact(ImpactHero),
    Home(HomeHero),
    About(AboutHero),
    Post(PostHero),
    Unknown { kind: String },
}

impl Hero {
    pub fn kind(&self) -> Option<HeroKind> {
        Some(match self {
            Hero::HighImpact(_) => HeroKind::HighImpact,
            Hero::MediumImpact(_) => HeroKind::MediumImpact,
            Hero::LowImpact(_) => HeroKind::LowImpact,
            Hero::Home(_) => HeroKind::Home,
            Hero::About(_) => HeroKind::About,
            Hero::Post(_) => HeroKind::Post,
            Hero::None | Hero::Unknown { .. } => return None,
        })
    }

    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("none")
            .to_string();
        if kind == "none" {
            return Hero::None;
        }

        let Some(known) = HeroKind::from_discriminator(&kind) else {
            return Hero::Unknown { kind };
        };

        let decoded = match known {
            HeroKind::HighImpact => ImpactHero::deserialize(&value).map(Hero::HighImpact),
            HeroKind::MediumImpact => ImpactHero::deserialize(&value).map(Hero::MediumImpact),
            HeroKind::LowImpact => ImpactHero::deserialize(&value).map(Hero::LowImpact),
            HeroKind::Home => HomeHero::deserialize(&value).map(Hero::Home),
            HeroKind::About => AboutHero::deserialize(&value).map(Hero::About),
            HeroKind::Post => PostHero::deserialize(&value).map(Hero::Post),
        };

        decoded.unwrap_or_else(|err| {
            warn!(hero_type = %kind, error = %err, "Hero fields failed to decode; skipping hero");
            Hero::Unknown { kind }
        })
    }
}

impl<'de> Deserialize<'de> for Hero {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Hero::from_value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactHero {
    #[serde(default)]
    pub rich_text: Option<RichText>,
    #[serde(default)]
    pub links: Vec<LinkRow>,
    #[serde(default)]
    pub media: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HomeHeroLeft {
    #[serde(default)]
    pub tagline: Option<String>,
    /// Rating shown beside the tagline; clamped to 0..=5 when rendered.
    #[serde(default)]
    pub stars: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub links: Vec<LinkRow>,
}

impl HomeHeroLeft {
    pub fn stars(&self) -> u8 {
        self.stars.unwrap_or(0).clamp(0, 5) as u8
    }
}

/// A column of `imageCard` and `infoCard` blocks.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HomeHeroColumn {
    #[serde(default)]
    pub cards: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HomeHeroRight {
    #[serde(default)]
    pub columns: Vec<HomeHeroColumn>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HomeHero {
    #[serde(default)]
    pub left: HomeHeroLeft,
    #[serde(default)]
    pub right: HomeHeroRight,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutHeroGroup {
    #[serde(default)]
    pub photo: Option<MediaRef>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub rich_text: Option<RichText>,
    #[serde(default)]
    pub links: Vec<LinkRow>,
}

/// The CMS stores the about hero's fields in a group named `O meni`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AboutHero {
    #[serde(default, rename = "O meni")]
    pub about: AboutHeroGroup,
}

/// Hero shown above a post body; built from the post itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostHero {
    pub title: String,
    #[serde(default)]
    pub media: Option<MediaRef>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}
