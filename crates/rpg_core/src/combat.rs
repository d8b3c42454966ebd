//! Accuracy rolls and hit chance.
//!
//! This module implements the classic accuracy model:
//! - An attack roll from the attacker's effective level and equipment bonus
//! - A defence roll from the defender's effective level, style and prayers
//! - A hit chance comparing the two rolls
//!
//! Damage amounts are not rolled here; only whether an attack lands.
//! Every calculation is integer or fixed-point, so identical inputs always
//! produce bit-identical output.

use fixed::types::I64F64;
use serde::{Deserialize, Serialize};

use crate::math::Fixed;
use crate::skills::{combat_level, CombatLevels, SkillState};

/// Flat bonus added to every effective level.
const EFFECTIVE_LEVEL_BASE: i32 = 8;

/// Offset added to equipment bonuses before multiplying.
const EQUIPMENT_BONUS_OFFSET: i32 = 64;

/// Broad class of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackType {
    /// Stab, slash or crush weapons.
    #[default]
    Melee,
    /// Bows, crossbows and thrown weapons.
    Ranged,
    /// Spells.
    Magic,
}

/// Stance chosen by a combatant; decides which stat receives a roll bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatStyle {
    /// +3 to attack.
    #[default]
    Accurate,
    /// Trains strength; no accuracy bonus.
    Aggressive,
    /// +3 to defence.
    Defensive,
    /// +1 to attack and defence.
    Controlled,
    /// Ranged stance with +3 to defence.
    Longrange,
}

impl CombatStyle {
    /// Invisible bonus this style adds to the attack level.
    #[must_use]
    pub const fn attack_bonus(self) -> i32 {
        match self {
            CombatStyle::Accurate => 3,
            CombatStyle::Controlled => 1,
            _ => 0,
        }
    }

    /// Invisible bonus this style adds to the defence level.
    #[must_use]
    pub const fn defense_bonus(self) -> i32 {
        match self {
            CombatStyle::Defensive | CombatStyle::Longrange => 3,
            CombatStyle::Controlled => 1,
            _ => 0,
        }
    }
}

/// Leveled combat skills of one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantStats {
    /// Attack skill.
    pub attack: SkillState,
    /// Strength skill.
    pub strength: SkillState,
    /// Defence skill.
    pub defense: SkillState,
    /// Ranged skill.
    pub ranged: SkillState,
    /// Magic skill.
    pub magic: SkillState,
    /// Hitpoints skill.
    pub hitpoints: SkillState,
    /// Prayer skill.
    pub prayer: SkillState,
}

impl Default for CombatantStats {
    fn default() -> Self {
        let one = SkillState::at_level(1);
        Self {
            attack: one,
            strength: one,
            defense: one,
            ranged: one,
            magic: one,
            hitpoints: SkillState::at_level(10),
            prayer: one,
        }
    }
}

impl CombatantStats {
    /// Every combat skill at `level`, hitpoints at least 10.
    #[must_use]
    pub fn uniform(level: u8) -> Self {
        let state = SkillState::at_level(level);
        Self {
            attack: state,
            strength: state,
            defense: state,
            ranged: state,
            magic: state,
            hitpoints: SkillState::at_level(level.max(10)),
            prayer: state,
        }
    }

    /// Level of the skill that drives accuracy for `attack_type`.
    #[must_use]
    pub fn accuracy_level(&self, attack_type: AttackType) -> i32 {
        let skill = match attack_type {
            AttackType::Melee => self.attack,
            AttackType::Ranged => self.ranged,
            AttackType::Magic => self.magic,
        };
        i32::from(skill.level())
    }

    /// Combat level derived from these stats.
    #[must_use]
    pub fn combat_level(&self) -> u32 {
        combat_level(CombatLevels {
            attack: self.attack.level().into(),
            strength: self.strength.level().into(),
            defence: self.defense.level().into(),
            hitpoints: self.hitpoints.level().into(),
            prayer: self.prayer.level().into(),
            ranged: self.ranged.level().into(),
            magic: self.magic.level().into(),
        })
    }
}

/// Equipment bonuses for one style family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StyleBonuses {
    /// Stab bonus.
    pub stab: i32,
    /// Slash bonus.
    pub slash: i32,
    /// Crush bonus.
    pub crush: i32,
    /// Ranged bonus.
    pub ranged: i32,
    /// Magic bonus.
    pub magic: i32,
}

/// Summed equipment bonuses of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CombatBonuses {
    /// Offensive bonuses.
    pub attack: StyleBonuses,
    /// Defensive bonuses.
    pub defense: StyleBonuses,
}

impl CombatBonuses {
    /// Equipment accuracy bonus for an outgoing attack.
    ///
    /// Melee uses the best of stab, slash and crush.
    #[must_use]
    pub fn attack_bonus(&self, attack_type: AttackType) -> i32 {
        let a = &self.attack;
        match attack_type {
            AttackType::Melee => a.stab.max(a.slash).max(a.crush),
            AttackType::Ranged => a.ranged,
            AttackType::Magic => a.magic,
        }
    }

    /// Equipment defence bonus against an incoming attack.
    ///
    /// Melee uses the floored mean of stab, slash and crush.
    #[must_use]
    pub fn defense_bonus(&self, incoming: AttackType) -> i32 {
        let d = &self.defense;
        match incoming {
            AttackType::Melee => (d.stab + d.slash + d.crush).div_euclid(3),
            AttackType::Ranged => d.ranged,
            AttackType::Magic => d.magic,
        }
    }
}

/// Toggled prayers that can affect defence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActivePrayers {
    /// Piety (melee).
    pub piety: bool,
    /// Rigour (ranged).
    pub rigour: bool,
    /// Augury (magic).
    pub augury: bool,
    /// Chivalry.
    pub chivalry: bool,
    /// Steel Skin.
    pub steel_skin: bool,
    /// Rock Skin.
    pub rock_skin: bool,
    /// Thick Skin.
    pub thick_skin: bool,
}

impl ActivePrayers {
    /// No prayers active.
    pub const NONE: Self = Self {
        piety: false,
        rigour: false,
        augury: false,
        chivalry: false,
        steel_skin: false,
        rock_skin: false,
        thick_skin: false,
    };

    /// Defence multiplier in percent.
    ///
    /// Only the strongest active prayer applies; they never stack.
    #[must_use]
    pub const fn defense_multiplier_percent(&self) -> i32 {
        if self.piety || self.rigour || self.augury {
            125
        } else if self.chivalry {
            120
        } else if self.steel_skin {
            115
        } else if self.rock_skin {
            110
        } else if self.thick_skin {
            105
        } else {
            100
        }
    }
}

/// Everything the calculator needs about one side of a fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Combatant {
    /// Skill levels.
    pub stats: CombatantStats,
    /// Equipment bonuses.
    pub bonuses: CombatBonuses,
    /// Active prayers.
    pub prayers: ActivePrayers,
    /// Chosen combat style.
    pub style: CombatStyle,
}

/// Effective attack level: skill level plus style bonus plus 8.
#[must_use]
pub fn effective_attack_level(
    attacker: &CombatantStats,
    style: CombatStyle,
    attack_type: AttackType,
) -> i32 {
    attacker.accuracy_level(attack_type) + style.attack_bonus() + EFFECTIVE_LEVEL_BASE
}

/// Effective defence level: `floor((defence + style) * prayer) + 8`.
#[must_use]
pub fn effective_defense_level(
    defender: &CombatantStats,
    prayers: &ActivePrayers,
    style: CombatStyle,
) -> i32 {
    let boosted = i32::from(defender.defense.level()) + style.defense_bonus();
    (boosted * prayers.defense_multiplier_percent()).div_euclid(100) + EFFECTIVE_LEVEL_BASE
}

/// Attack roll: `effective_attack_level * (equipment_bonus + 64)`.
#[must_use]
pub fn attack_roll(
    attacker: &CombatantStats,
    bonuses: &CombatBonuses,
    style: CombatStyle,
    attack_type: AttackType,
) -> i32 {
    effective_attack_level(attacker, style, attack_type)
        * (bonuses.attack_bonus(attack_type) + EQUIPMENT_BONUS_OFFSET)
}

/// Defence roll: `effective_defense_level * (defence_bonus + 64)`.
#[must_use]
pub fn defense_roll(
    defender: &CombatantStats,
    bonuses: &CombatBonuses,
    prayers: &ActivePrayers,
    incoming: AttackType,
    defender_style: CombatStyle,
) -> i32 {
    effective_defense_level(defender, prayers, defender_style)
        * (bonuses.defense_bonus(incoming) + EQUIPMENT_BONUS_OFFSET)
}

/// Probability that an attack lands, in `[0, 1]`.
///
/// ```text
/// attack > defence:  1 - (defence + 2) / (2 * (attack + 1))
/// otherwise:         attack / (2 * (defence + 1))
/// ```
///
/// Negative rolls (only reachable through negative equipment bonuses) are
/// treated as 0. Any pair of `i32` rolls is accepted; the ratio is formed in
/// `I64F64` so `2 * (roll + 1)` cannot overflow.
#[must_use]
pub fn hit_chance(attack_roll: i32, defense_roll: i32) -> Fixed {
    let attack = i64::from(attack_roll.max(0));
    let defense = i64::from(defense_roll.max(0));
    // Both ratios below lie in [0, 1], so narrowing back to `Fixed` is exact
    // up to truncation.
    let ratio = |num: i64, den: i64| Fixed::from_num(I64F64::from_num(num) / I64F64::from_num(den));

    if attack > defense {
        Fixed::ONE - ratio(defense + 2, 2 * (attack + 1))
    } else {
        ratio(attack, 2 * (defense + 1))
    }
}

/// Hit chance of `attacker` against `defender` for one attack.
#[must_use]
pub fn hit_chance_between(
    attacker: &Combatant,
    defender: &Combatant,
    attack_type: AttackType,
) -> Fixed {
    let attack = attack_roll(&attacker.stats, &attacker.bonuses, attacker.style, attack_type);
    let defense = defense_roll(
        &defender.stats,
        &defender.bonuses,
        &defender.prayers,
        attack_type,
        defender.style,
    );

    tracing::trace!(attack, defense, ?attack_type, "Accuracy rolls");
    hit_chance(attack, defense)
}
