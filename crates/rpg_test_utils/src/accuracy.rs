//! Accuracy tables for combat tuning.
//!
//! Sweeps hit chance across level matchups so tests can check the shape of
//! the curve without hard-coding individual probabilities.

use rpg_core::combat::{hit_chance_between, AttackType, Combatant};
use rpg_core::math::Fixed;

use crate::fixtures::combatant;

/// Hit chance of one level matchup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matchup {
    /// Attacker's uniform combat level.
    pub attacker_level: u8,
    /// Defender's uniform combat level.
    pub defender_level: u8,
    /// Chance for the attacker to land a hit.
    pub hit_chance: Fixed,
}

impl Matchup {
    /// Expected number of landed hits over `attacks` swings.
    #[must_use]
    pub fn expected_hits(&self, attacks: u32) -> Fixed {
        self.hit_chance * Fixed::from_num(attacks)
    }
}

/// Hit chance for every pair of `levels`, attacker-major.
///
/// Both sides use ungeared [`combatant`]s with default style and prayers.
#[must_use]
pub fn accuracy_matrix(levels: &[u8], attack_type: AttackType) -> Vec<Matchup> {
    let mut results = Vec::with_capacity(levels.len() * levels.len());

    for &attacker_level in levels {
        for &defender_level in levels {
            let chance = hit_chance_between(
                &combatant(attacker_level),
                &combatant(defender_level),
                attack_type,
            );
            results.push(Matchup {
                attacker_level,
                defender_level,
                hit_chance: chance,
            });
        }
    }

    results
}

/// Hit chance of `attacker` against each of `defenders`.
#[must_use]
pub fn sweep_defenders(
    attacker: &Combatant,
    defenders: &[Combatant],
    attack_type: AttackType,
) -> Vec<Fixed> {
    defenders
        .iter()
        .map(|defender| hit_chance_between(attacker, defender, attack_type))
        .collect()
}

/// Whether `values` never decreases.
#[must_use]
pub fn is_non_decreasing(values: &[Fixed]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

/// Whether `values` never increases.
#[must_use]
pub fn is_non_increasing(values: &[Fixed]) -> bool {
    values.windows(2).all(|w| w[0] >= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::geared_combatant;

    const LEVELS: [u8; 5] = [1, 20, 40, 70, 99];

    fn chance(matrix: &[Matchup], attacker: u8, defender: u8) -> Fixed {
        matrix
            .iter()
            .find(|m| m.attacker_level == attacker && m.defender_level == defender)
            .map(|m| m.hit_chance)
            .unwrap()
    }

    #[test]
    fn test_matrix_covers_every_pair() {
        let matrix = accuracy_matrix(&LEVELS, AttackType::Melee);
        assert_eq!(matrix.len(), LEVELS.len() * LEVELS.len());
        assert!(matrix
            .iter()
            .all(|m| m.hit_chance >= Fixed::ZERO && m.hit_chance <= Fixed::ONE));
    }

    #[test]
    fn test_higher_attacker_hits_more_often() {
        let matrix = accuracy_matrix(&LEVELS, AttackType::Ranged);
        for defender in LEVELS {
            let column: Vec<Fixed> = LEVELS.iter().map(|&a| chance(&matrix, a, defender)).collect();
            assert!(is_non_decreasing(&column), "defender {defender}: {column:?}");
        }
    }

    #[test]
    fn test_armour_lowers_hit_chance() {
        let attacker = combatant(60);
        let defenders: Vec<Combatant> = [0, 40, 80, 120]
            .into_iter()
            .map(|bonus| geared_combatant(60, 0, bonus))
            .collect();

        let chances = sweep_defenders(&attacker, &defenders, AttackType::Magic);
        assert!(is_non_increasing(&chances));
        assert!(chances[0] > chances[3]);
    }

    #[test]
    fn test_expected_hits() {
        let matchup = Matchup {
            attacker_level: 1,
            defender_level: 1,
            hit_chance: Fixed::from_num(0.25),
        };
        assert_eq!(matchup.expected_hits(100), Fixed::from_num(25));
    }
}
