// Creature records: one computed row per (identity, form) pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::{has_mega, has_max, has_shadow};
use super::types::PokemonType;

/// A named variant of a species with its own derived stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Normal,
    Mega,
    Shadow,
    Max,
}

impl Form {
    pub fn as_str(self) -> &'static str {
        match self {
            Form::Normal => "normal",
            Form::Mega => "mega",
            Form::Shadow => "shadow",
            Form::Max => "max",
        }
    }

    /// Forms to ingest for an identity: always `Normal`, then each special form
    /// the identity is eligible for.
    pub fn eligible_for(id: i64) -> Vec<Form> {
        let mut forms = vec![Form::Normal];
        if has_mega(id) {
            forms.push(Form::Mega);
        }
        if has_shadow(id) {
            forms.push(Form::Shadow);
        }
        if has_max(id) {
            forms.push(Form::Max);
        }
        forms
    }

    /// Form-qualified display name: "Charizard" or "Charizard (Mega)".
    pub fn display_name(self, species: &str) -> String {
        let base = title_case(species);
        match self {
            Form::Normal => base,
            other => format!("{base} ({})", title_case(other.as_str())),
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Form {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Form::Normal),
            "mega" => Ok(Form::Mega),
            "shadow" => Ok(Form::Shadow),
            "max" => Ok(Form::Max),
            other => Err(format!("unknown form '{other}'")),
        }
    }
}

/// Capitalize the first letter of every alphabetic run ("mr-mime" -> "Mr-Mime").
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// General base stats as reported by the upstream data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    #[serde(rename = "special-attack")]
    pub special_attack: u32,
    #[serde(rename = "special-defense")]
    pub special_defense: u32,
    pub speed: u32,
}

/// Game-specific battle stats. Every value is at least 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub attack: u32,
    pub defense: u32,
    pub stamina: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatureRecord {
    pub identity: i64,
    pub display_name: String,
    pub form: Form,
    pub primary_type: PokemonType,
    pub secondary_type: Option<PokemonType>,
    pub base_stats: BaseStats,
    pub derived_stats: DerivedStats,
    pub available_in_game: bool,
    pub is_legendary_class: bool,
}

impl CreatureRecord {
    /// Primary type followed by the secondary type, if any.
    pub fn types(&self) -> Vec<PokemonType> {
        let mut types = vec![self.primary_type];
        if let Some(t) = self.secondary_type {
            types.push(t);
        }
        types
    }

    pub fn has_type(&self, t: PokemonType) -> bool {
        self.primary_type == t || self.secondary_type == Some(t)
    }
}
