// Type effectiveness of an attacker against a defender.
//
// Each attacking type is scored as the product of its matrix entries against
// every defending type; the attacker's effectiveness is the best of those
// scores, starting from neutral (1.0).

use super::types::PokemonType;

pub fn calculate_effectiveness(attacker: &[PokemonType], defender: &[PokemonType]) -> f64 {
    let mut effectiveness = 1.0;

    for att in attacker {
        let type_mult: f64 = defender
            .iter()
            .map(|def| att.multiplier_against(*def).unwrap_or(1.0))
            .product();
        if type_mult > effectiveness {
            effectiveness = type_mult;
        }
    }

    effectiveness
}
