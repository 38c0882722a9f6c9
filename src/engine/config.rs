// Static reference tables: game availability, legendary class and special-form eligibility.
//
// Every table is a sorted slice so membership is a binary search.

/// Highest national dex number released in the game (generations 1-8).
pub const LAST_AVAILABLE_ID: i64 = 898;

/// Upper bound on identities visited by a population pass.
pub const DEFAULT_INGEST_LIMIT: usize = 1010;

/// Default number of top attackers returned by the ranking endpoints.
pub const DEFAULT_RANKING_LIMIT: usize = 25;

// Derived stat floor and the safe default used when base stats are malformed
pub const MIN_DERIVED_STAT: u32 = 10;

// Form attack bonuses, in tenths: mega x1.3, shadow x1.2, max x1.1
pub const MEGA_BONUS_TENTHS: u32 = 13;
pub const SHADOW_BONUS_TENTHS: u32 = 12;
pub const MAX_BONUS_TENTHS: u32 = 11;

// Type effectiveness multipliers
pub const SUPER_EFFECTIVE: f64 = 1.6;
pub const NOT_VERY_EFFECTIVE: f64 = 0.625;
pub const DOUBLE_RESISTED: f64 = 0.390625;

/// Legendary, mythical and ultra beast identities.
pub const LEGENDARY_IDS: &[i64] = &[
    // Gen 1
    144, 145, 146, 150, 151,
    // Gen 2
    243, 244, 245, 249, 250, 251,
    // Gen 3
    377, 378, 379, 380, 381, 382, 383, 384, 385, 386,
    // Gen 4
    480, 481, 482, 483, 484, 485, 486, 487, 488, 489, 490, 491, 492, 493,
    // Gen 5
    494, 638, 639, 640, 641, 642, 643, 644, 645, 646, 647, 648, 649,
    // Gen 6
    716, 717, 718, 719, 720, 721,
    // Gen 7
    772, 773, 785, 786, 787, 788, 789, 790, 791, 792, 793, 794, 795, 796, 797, 798, 799, 800,
    801, 802, 803, 804, 805, 806, 807, 808, 809,
    // Gen 8 (partial)
    888, 889, 890, 891, 892, 893, 894, 895, 896, 897, 898,
];

/// Identities with a Mega Evolution.
pub const MEGA_IDS: &[i64] = &[
    3, 6, 9, 65, 80, 94, 115, 127, 130, 142, 150, 181, 208, 212, 214, 229, 248, 254, 257, 260,
    282, 302, 303, 306, 308, 310, 319, 323, 334, 354, 359, 362, 373, 376, 380, 381, 384, 428,
    445, 448, 460,
];

/// Identities that can be caught as Shadow.
pub const SHADOW_IDS: &[i64] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 23, 24, 27, 28, 29,
    30, 31, 32, 33, 34, 37, 38, 41, 42, 43, 44, 45, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58,
    59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 79, 80, 81, 82, 88,
    89, 90, 91, 92, 93, 94, 95, 96, 97, 100, 101, 102, 103, 104, 105, 106, 107, 109, 110, 111,
    112, 114, 116, 117, 121, 123, 125, 126, 127, 129, 130, 131, 137, 138, 139, 142, 143, 144,
    145, 146, 147, 148, 149, 150,
];

/// Identities with a Dynamax form.
pub const DYNAMAX_IDS: &[i64] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 66, 67, 68, 92, 93, 94, 98, 99, 131, 138, 139, 140,
    141, 143, 144, 145, 146, 213, 241, 242, 243, 244, 245, 302, 320, 321, 374, 375, 376, 380,
    381, 519, 520, 521, 529, 530, 554, 555, 568, 569, 615, 766, 810, 811, 812, 813, 814, 815,
    816, 817, 818, 819, 820, 821, 822, 823, 831, 832, 849, 856, 857, 858, 870, 891, 892, 893,
];

/// Identities with a Gigantamax form.
pub const GIGANTAMAX_IDS: &[i64] = &[3, 6, 9, 12, 68, 94, 99, 131, 143, 812, 815, 818, 849];

pub fn is_available_in_game(id: i64) -> bool {
    (1..=LAST_AVAILABLE_ID).contains(&id)
}

pub fn is_legendary(id: i64) -> bool {
    LEGENDARY_IDS.binary_search(&id).is_ok()
}

pub fn has_mega(id: i64) -> bool {
    MEGA_IDS.binary_search(&id).is_ok()
}

pub fn has_shadow(id: i64) -> bool {
    SHADOW_IDS.binary_search(&id).is_ok()
}

/// Dynamax or Gigantamax both count as a Max form.
pub fn has_max(id: i64) -> bool {
    DYNAMAX_IDS.binary_search(&id).is_ok() || GIGANTAMAX_IDS.binary_search(&id).is_ok()
}
