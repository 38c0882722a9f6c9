// Stat conversion: general base stats -> Pokemon GO attack/defense/stamina.
//
// speed_mod = 1 + (speed - 75) / 500
// attack    = 2 * (7/8 * higher(atk, spatk) + 1/8 * lower(atk, spatk)) * speed_mod
// defense   = 2 * (5/8 * higher(def, spdef) + 3/8 * lower(def, spdef)) * speed_mod
// stamina   = 50 + 1.75 * hp
//
// Each value is rounded half away from zero and floored at 10. Form bonuses
// multiply the floored attack and round up.

use std::collections::HashMap;

use super::config::{MAX_BONUS_TENTHS, MEGA_BONUS_TENTHS, MIN_DERIVED_STAT, SHADOW_BONUS_TENTHS};
use super::creature::{BaseStats, DerivedStats, Form};
use crate::error::PogoError;

/// Returned whenever base stats cannot be read.
pub const SAFE_DEFAULT_STATS: DerivedStats = DerivedStats {
    attack: MIN_DERIVED_STAT,
    defense: MIN_DERIVED_STAT,
    stamina: MIN_DERIVED_STAT,
};

const STAT_KEYS: [&str; 6] = [
    "hp",
    "attack",
    "defense",
    "special-attack",
    "special-defense",
    "speed",
];

fn round_and_floor(raw: f64) -> u32 {
    (raw.round().max(0.0) as u32).max(MIN_DERIVED_STAT)
}

/// Convert base stats to base-form derived stats.
pub fn derive_stats(base: &BaseStats) -> DerivedStats {
    let speed_mod = 1.0 + (base.speed as f64 - 75.0) / 500.0;

    let higher_attack = base.attack.max(base.special_attack) as f64;
    let lower_attack = base.attack.min(base.special_attack) as f64;
    let raw_attack = 2.0 * (7.0 / 8.0 * higher_attack + 1.0 / 8.0 * lower_attack) * speed_mod;

    let higher_defense = base.defense.max(base.special_defense) as f64;
    let lower_defense = base.defense.min(base.special_defense) as f64;
    let raw_defense = 2.0 * (5.0 / 8.0 * higher_defense + 3.0 / 8.0 * lower_defense) * speed_mod;

    let raw_stamina = 50.0 + 1.75 * base.hp as f64;

    DerivedStats {
        attack: round_and_floor(raw_attack),
        defense: round_and_floor(raw_defense),
        stamina: round_and_floor(raw_stamina),
    }
}

/// Attack multiplier of a form, in tenths.
fn bonus_tenths(form: Form) -> u32 {
    match form {
        Form::Normal => 10,
        Form::Mega => MEGA_BONUS_TENTHS,
        Form::Shadow => SHADOW_BONUS_TENTHS,
        Form::Max => MAX_BONUS_TENTHS,
    }
}

/// Apply the form's attack bonus. Integer ceiling, so 100 * 1.1 is exactly 110.
/// Clamps to `u32::MAX` on absurd upstream values.
pub fn apply_form_bonus(stats: DerivedStats, form: Form) -> DerivedStats {
    let boosted = (u64::from(stats.attack) * u64::from(bonus_tenths(form))).div_ceil(10);
    DerivedStats {
        attack: u32::try_from(boosted).unwrap_or(u32::MAX),
        ..stats
    }
}

pub fn derive_for_form(base: &BaseStats, form: Form) -> DerivedStats {
    apply_form_bonus(derive_stats(base), form)
}

/// Read the six upstream stat keys. Fails on the first missing key.
pub fn base_stats_from_named(stats: &HashMap<String, u32>) -> Result<BaseStats, PogoError> {
    let get = |key: &str| {
        stats
            .get(key)
            .copied()
            .ok_or_else(|| PogoError::MalformedStats(key.to_string()))
    };
    Ok(BaseStats {
        hp: get("hp")?,
        attack: get("attack")?,
        defense: get("defense")?,
        special_attack: get("special-attack")?,
        special_defense: get("special-defense")?,
        speed: get("speed")?,
    })
}

/// Derive stats from an upstream stat map without ever failing.
///
/// Missing keys are stored as 0 and the derived stats fall back to
/// [`SAFE_DEFAULT_STATS`]; the form bonus is still applied on top.
pub fn derive_from_named(stats: &HashMap<String, u32>, form: Form) -> (BaseStats, DerivedStats) {
    match base_stats_from_named(stats) {
        Ok(base) => (base, derive_for_form(&base, form)),
        Err(e) => {
            let missing: Vec<&str> = STAT_KEYS
                .iter()
                .copied()
                .filter(|k| !stats.contains_key(*k))
                .collect();
            tracing::warn!("Using default stats ({e}); missing keys: {missing:?}");
            let get = |key: &str| stats.get(key).copied().unwrap_or(0);
            let base = BaseStats {
                hp: get("hp"),
                attack: get("attack"),
                defense: get("defense"),
                special_attack: get("special-attack"),
                special_defense: get("special-defense"),
                speed: get("speed"),
            };
            (base, apply_form_bonus(SAFE_DEFAULT_STATS, form))
        }
    }
}
