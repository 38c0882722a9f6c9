// Pokemon type enumeration and the type-effectiveness matrix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::{DOUBLE_RESISTED, NOT_VERY_EFFECTIVE, SUPER_EFFECTIVE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokemonType {
    /// All types, in catalog order.
    pub const ALL: [PokemonType; 18] = [
        PokemonType::Normal,
        PokemonType::Fire,
        PokemonType::Water,
        PokemonType::Electric,
        PokemonType::Grass,
        PokemonType::Ice,
        PokemonType::Fighting,
        PokemonType::Poison,
        PokemonType::Ground,
        PokemonType::Flying,
        PokemonType::Psychic,
        PokemonType::Bug,
        PokemonType::Rock,
        PokemonType::Ghost,
        PokemonType::Dragon,
        PokemonType::Dark,
        PokemonType::Steel,
        PokemonType::Fairy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PokemonType::Normal => "normal",
            PokemonType::Fire => "fire",
            PokemonType::Water => "water",
            PokemonType::Electric => "electric",
            PokemonType::Grass => "grass",
            PokemonType::Ice => "ice",
            PokemonType::Fighting => "fighting",
            PokemonType::Poison => "poison",
            PokemonType::Ground => "ground",
            PokemonType::Flying => "flying",
            PokemonType::Psychic => "psychic",
            PokemonType::Bug => "bug",
            PokemonType::Rock => "rock",
            PokemonType::Ghost => "ghost",
            PokemonType::Dragon => "dragon",
            PokemonType::Dark => "dark",
            PokemonType::Steel => "steel",
            PokemonType::Fairy => "fairy",
        }
    }

    /// Title-cased name for display ("Fire").
    pub fn display_name(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }

    /// Damage multiplier of an attack of this type against a single defending type.
    /// Returns `None` for neutral pairings.
    pub fn multiplier_against(self, defender: PokemonType) -> Option<f64> {
        use PokemonType::*;

        let se = SUPER_EFFECTIVE;
        let nve = NOT_VERY_EFFECTIVE;
        let dr = DOUBLE_RESISTED;

        let m = match (self, defender) {
            (Normal, Rock) | (Normal, Steel) => nve,
            (Normal, Ghost) => dr,

            (Fire, Grass) | (Fire, Ice) | (Fire, Bug) | (Fire, Steel) | (Fire, Ground) => se,
            (Fire, Fire) | (Fire, Water) | (Fire, Rock) | (Fire, Dragon) => nve,

            (Water, Fire) | (Water, Ground) | (Water, Rock) => se,
            (Water, Water) | (Water, Grass) | (Water, Dragon) => nve,

            (Electric, Water) | (Electric, Flying) => se,
            (Electric, Electric) | (Electric, Grass) | (Electric, Dragon) => nve,
            (Electric, Ground) => dr,

            (Grass, Water) | (Grass, Electric) | (Grass, Rock) | (Grass, Ground) => se,
            (Grass, Fire)
            | (Grass, Grass)
            | (Grass, Poison)
            | (Grass, Flying)
            | (Grass, Bug)
            | (Grass, Dragon)
            | (Grass, Steel) => nve,

            (Ice, Grass) | (Ice, Ground) | (Ice, Flying) | (Ice, Dragon) => se,
            (Ice, Fire) | (Ice, Water) | (Ice, Ice) | (Ice, Steel) => nve,

            (Fighting, Normal)
            | (Fighting, Ice)
            | (Fighting, Rock)
            | (Fighting, Dark)
            | (Fighting, Steel) => se,
            (Fighting, Poison)
            | (Fighting, Flying)
            | (Fighting, Psychic)
            | (Fighting, Bug)
            | (Fighting, Fairy) => nve,
            (Fighting, Ghost) => dr,

            (Poison, Grass) | (Poison, Fairy) => se,
            (Poison, Poison) | (Poison, Ground) | (Poison, Rock) | (Poison, Ghost) => nve,
            (Poison, Steel) => dr,

            (Ground, Fire)
            | (Ground, Electric)
            | (Ground, Poison)
            | (Ground, Rock)
            | (Ground, Steel) => se,
            (Ground, Grass) | (Ground, Bug) => nve,
            (Ground, Flying) => dr,

            (Flying, Grass) | (Flying, Fighting) | (Flying, Bug) => se,
            (Flying, Electric) | (Flying, Ice) | (Flying, Rock) | (Flying, Steel) => nve,

            (Psychic, Fighting) | (Psychic, Poison) => se,
            (Psychic, Psychic) | (Psychic, Steel) => nve,
            (Psychic, Dark) => dr,

            (Bug, Grass) | (Bug, Psychic) | (Bug, Dark) => se,
            (Bug, Fire)
            | (Bug, Fighting)
            | (Bug, Poison)
            | (Bug, Flying)
            | (Bug, Ghost)
            | (Bug, Steel)
            | (Bug, Fairy) => nve,

            (Rock, Fire) | (Rock, Ice) | (Rock, Flying) | (Rock, Bug) => se,
            (Rock, Fighting) | (Rock, Ground) | (Rock, Steel) => nve,

            (Ghost, Psychic) | (Ghost, Ghost) => se,
            (Ghost, Dark) => nve,
            (Ghost, Normal) => dr,

            (Dragon, Dragon) => se,
            (Dragon, Steel) => nve,
            (Dragon, Fairy) => dr,

            (Dark, Psychic) | (Dark, Ghost) => se,
            (Dark, Fighting) | (Dark, Dark) | (Dark, Fairy) => nve,

            (Steel, Ice) | (Steel, Rock) | (Steel, Fairy) => se,
            (Steel, Fire) | (Steel, Water) | (Steel, Electric) | (Steel, Steel) => nve,

            (Fairy, Fighting) | (Fairy, Dragon) | (Fairy, Dark) => se,
            (Fairy, Fire) | (Fairy, Poison) | (Fairy, Steel) => nve,

            _ => return None,
        };
        Some(m)
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType(pub String);

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown type '{}'", self.0)
    }
}

impl FromStr for PokemonType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        PokemonType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or(UnknownType(s.to_string()))
    }
}
