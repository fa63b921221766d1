//! Bundled game variants, embedded from `games/*.yaml`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::GameDefinition;
use crate::engine::OutcomeEngine;
use crate::error::{ConfigError, ConfigResult};
use crate::parser::DefinitionParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameVariant {
    FortuneTiger,
    ZodiacFortune,
    DragonGold,
    Pirate,
    NeonNight,
}

impl GameVariant {
    pub const ALL: [GameVariant; 5] = [
        GameVariant::FortuneTiger,
        GameVariant::ZodiacFortune,
        GameVariant::DragonGold,
        GameVariant::Pirate,
        GameVariant::NeonNight,
    ];

    /// Identifier used on the command line and in definition files
    pub fn id(&self) -> &'static str {
        match self {
            GameVariant::FortuneTiger => "fortune-tiger",
            GameVariant::ZodiacFortune => "zodiac-fortune",
            GameVariant::DragonGold => "dragon-gold",
            GameVariant::Pirate => "pirate",
            GameVariant::NeonNight => "neon-night",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.id() == id)
    }

    /// Raw YAML source of the bundled definition
    pub fn source(&self) -> &'static str {
        match self {
            GameVariant::FortuneTiger => include_str!("../games/fortune_tiger.yaml"),
            GameVariant::ZodiacFortune => include_str!("../games/zodiac_fortune.yaml"),
            GameVariant::DragonGold => include_str!("../games/dragon_gold.yaml"),
            GameVariant::Pirate => include_str!("../games/pirate.yaml"),
            GameVariant::NeonNight => include_str!("../games/neon_night.yaml"),
        }
    }

    pub fn definition(&self) -> ConfigResult<GameDefinition> {
        DefinitionParser::new().parse_yaml(self.source())
    }

    pub fn engine(&self) -> ConfigResult<OutcomeEngine> {
        OutcomeEngine::new(self.definition()?)
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GameVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
            .ok_or_else(|| ConfigError::InvalidParam(format!("unknown game variant '{s}'")))
    }
}
