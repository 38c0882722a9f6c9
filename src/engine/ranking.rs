// Top-attacker ranking: filter, score, stable sort, truncate.

use serde::Serialize;

use super::creature::{CreatureRecord, Form};
use super::effectiveness::calculate_effectiveness;
use super::types::PokemonType;

/// How a boolean facet restricts the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Only,
    Exclude,
}

impl FilterMode {
    /// Parse a query-string value. Anything other than "only"/"exclude" means `All`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("only") => FilterMode::Only,
            Some("exclude") => FilterMode::Exclude,
            _ => FilterMode::All,
        }
    }

    fn admits(self, facet: bool) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Only => facet,
            FilterMode::Exclude => !facet,
        }
    }
}

/// Inclusion filters applied before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RankingFilters {
    pub legendary_filter: FilterMode,
    pub mega_filter: FilterMode,
    pub shadow_filter: FilterMode,
    pub max_filter: FilterMode,
}

impl RankingFilters {
    /// Form facets test the row's own form, not the species' eligibility.
    pub fn admits(&self, record: &CreatureRecord) -> bool {
        record.available_in_game
            && self.legendary_filter.admits(record.is_legendary_class)
            && self.mega_filter.admits(record.form == Form::Mega)
            && self.shadow_filter.admits(record.form == Form::Shadow)
            && self.max_filter.admits(record.form == Form::Max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAttacker {
    pub record: CreatureRecord,
    pub effectiveness: f64,
    pub effective_attack: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub entries: Vec<RankedAttacker>,
    /// Records that passed the filters, before truncation.
    pub total_candidates: usize,
}

/// Rank candidates by `attack * effectiveness` against `defender`.
///
/// Ties keep the order of `candidates`.
pub fn top_attackers(
    candidates: &[CreatureRecord],
    defender: &CreatureRecord,
    filters: &RankingFilters,
    limit: usize,
) -> Ranking {
    let defender_types = defender.types();

    let mut attackers: Vec<RankedAttacker> = candidates
        .iter()
        .filter(|r| filters.admits(r))
        .map(|r| {
            let effectiveness = calculate_effectiveness(&r.types(), &defender_types);
            RankedAttacker {
                effective_attack: r.derived_stats.attack as f64 * effectiveness,
                effectiveness,
                record: r.clone(),
            }
        })
        .collect();

    let total_candidates = attackers.len();
    attackers.sort_by(|a, b| b.effective_attack.total_cmp(&a.effective_attack));
    attackers.truncate(limit);

    Ranking {
        entries: attackers,
        total_candidates,
    }
}

/// Rank candidates of a given type by raw derived attack.
pub fn top_attackers_by_type(
    candidates: &[CreatureRecord],
    attack_type: PokemonType,
    filters: &RankingFilters,
    limit: usize,
) -> Ranking {
    let mut attackers: Vec<RankedAttacker> = candidates
        .iter()
        .filter(|r| r.has_type(attack_type) && filters.admits(r))
        .map(|r| RankedAttacker {
            effectiveness: 1.0,
            effective_attack: r.derived_stats.attack as f64,
            record: r.clone(),
        })
        .collect();

    let total_candidates = attackers.len();
    attackers.sort_by(|a, b| b.record.derived_stats.attack.cmp(&a.record.derived_stats.attack));
    attackers.truncate(limit);

    Ranking {
        entries: attackers,
        total_candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::creature::{BaseStats, DerivedStats};
    use PokemonType::*;

    fn record(
        identity: i64,
        form: Form,
        types: (PokemonType, Option<PokemonType>),
        attack: u32,
        legendary: bool,
    ) -> CreatureRecord {
        CreatureRecord {
            identity,
            display_name: format!("#{identity} {form}"),
            form,
            primary_type: types.0,
            secondary_type: types.1,
            base_stats: BaseStats::default(),
            derived_stats: DerivedStats {
                attack,
                defense: 100,
                stamina: 100,
            },
            available_in_game: true,
            is_legendary_class: legendary,
        }
    }

    fn roster() -> Vec<CreatureRecord> {
        vec![
            record(6, Form::Normal, (Fire, Some(Flying)), 222, false),
            record(6, Form::Mega, (Fire, Some(Flying)), 289, false),
            record(6, Form::Shadow, (Fire, Some(Flying)), 267, false),
            record(9, Form::Normal, (Water, None), 171, false),
            record(9, Form::Max, (Water, None), 189, false),
            record(150, Form::Normal, (Psychic, None), 300, true),
            record(382, Form::Normal, (Water, None), 270, true),
            record(25, Form::Normal, (Electric, None), 112, false),
        ]
    }

    fn defender(types: (PokemonType, Option<PokemonType>)) -> CreatureRecord {
        record(1000, Form::Normal, types, 100, false)
    }

    #[test]
    fn test_filter_mode_parse() {
        assert_eq!(FilterMode::from_query(Some("only")), FilterMode::Only);
        assert_eq!(FilterMode::from_query(Some("EXCLUDE")), FilterMode::Exclude);
        assert_eq!(FilterMode::from_query(Some("all")), FilterMode::All);
        assert_eq!(FilterMode::from_query(Some("bogus")), FilterMode::All);
        assert_eq!(FilterMode::from_query(None), FilterMode::All);
    }

    #[test]
    fn test_ranking_sorted_and_limited() {
        let fire = defender((Fire, None));
        let ranking = top_attackers(&roster(), &fire, &RankingFilters::default(), 3);
        assert_eq!(ranking.entries.len(), 3);
        assert_eq!(ranking.total_candidates, 8);
        for pair in ranking.entries.windows(2) {
            assert!(pair[0].effective_attack >= pair[1].effective_attack);
        }
        // Kyogre: 270 * 1.6
        assert_eq!(ranking.entries[0].record.identity, 382);
        assert!((ranking.entries[0].effective_attack - 432.0).abs() < 1e-9);
    }

    #[test]
    fn test_limit_larger_than_candidates() {
        let normal = defender((Normal, None));
        let ranking = top_attackers(&roster(), &normal, &RankingFilters::default(), 25);
        assert_eq!(ranking.entries.len(), 8);
    }

    #[test]
    fn test_ties_keep_scan_order() {
        let candidates = vec![
            record(1, Form::Normal, (Normal, None), 150, false),
            record(2, Form::Normal, (Normal, None), 150, false),
            record(3, Form::Normal, (Normal, None), 150, false),
        ];
        let normal = defender((Normal, None));
        let ranking = top_attackers(&candidates, &normal, &RankingFilters::default(), 25);
        let ids: Vec<i64> = ranking.entries.iter().map(|e| e.record.identity).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_legendary_only() {
        let filters = RankingFilters {
            legendary_filter: FilterMode::Only,
            ..Default::default()
        };
        let ranking = top_attackers(&roster(), &defender((Normal, None)), &filters, 25);
        assert_eq!(ranking.entries.len(), 2);
        assert!(ranking.entries.iter().all(|e| e.record.is_legendary_class));
    }

    #[test]
    fn test_mega_exclude() {
        let filters = RankingFilters {
            mega_filter: FilterMode::Exclude,
            ..Default::default()
        };
        let ranking = top_attackers(&roster(), &defender((Grass, None)), &filters, 25);
        assert_eq!(ranking.total_candidates, 7);
        assert!(ranking.entries.iter().all(|e| e.record.form != Form::Mega));
    }

    #[test]
    fn test_shadow_exclude_drops_shadow_rows_only() {
        let filters = RankingFilters {
            shadow_filter: FilterMode::Exclude,
            ..Default::default()
        };
        let ranking = top_attackers(&roster(), &defender((Grass, None)), &filters, 25);
        // Exactly the one shadow row is removed; non-shadow rows all survive.
        assert_eq!(ranking.total_candidates, 7);
        assert!(ranking.entries.iter().all(|e| e.record.form != Form::Shadow));
        assert!(ranking
            .entries
            .iter()
            .any(|e| e.record.identity == 6 && e.record.form == Form::Normal));
    }

    #[test]
    fn test_max_only() {
        let filters = RankingFilters {
            max_filter: FilterMode::Only,
            ..Default::default()
        };
        let ranking = top_attackers(&roster(), &defender((Fire, None)), &filters, 25);
        assert_eq!(ranking.entries.len(), 1);
        assert_eq!(ranking.entries[0].record.form, Form::Max);
    }

    #[test]
    fn test_unavailable_records_are_skipped() {
        let mut candidates = roster();
        candidates[0].available_in_game = false;
        let normal = defender((Normal, None));
        let ranking = top_attackers(&candidates, &normal, &RankingFilters::default(), 25);
        assert_eq!(ranking.total_candidates, 7);
    }

    #[test]
    fn test_by_type_filters_and_sorts_by_attack() {
        let ranking = top_attackers_by_type(&roster(), Water, &RankingFilters::default(), 25);
        let ids: Vec<(i64, Form)> = ranking
            .entries
            .iter()
            .map(|e| (e.record.identity, e.record.form))
            .collect();
        assert_eq!(ids, vec![(382, Form::Normal), (9, Form::Max), (9, Form::Normal)]);
        assert_eq!(ranking.total_candidates, 3);
    }

    #[test]
    fn test_by_type_ties_keep_scan_order() {
        let candidates = vec![
            record(7, Form::Normal, (Water, None), 180, false),
            record(8, Form::Normal, (Water, Some(Ice)), 200, false),
            record(3, Form::Shadow, (Grass, Some(Water)), 180, false),
            record(5, Form::Normal, (Water, None), 180, false),
        ];
        let ranking = top_attackers_by_type(&candidates, Water, &RankingFilters::default(), 25);
        let ids: Vec<i64> = ranking.entries.iter().map(|e| e.record.identity).collect();
        assert_eq!(ids, vec![8, 7, 3, 5]);
    }

    #[test]
    fn test_by_type_matches_secondary_type() {
        let ranking = top_attackers_by_type(&roster(), Flying, &RankingFilters::default(), 2);
        assert_eq!(ranking.entries.len(), 2);
        assert_eq!(ranking.total_candidates, 3);
        assert_eq!(ranking.entries[0].record.form, Form::Mega);
        assert_eq!(ranking.entries[1].record.form, Form::Shadow);
    }
}
