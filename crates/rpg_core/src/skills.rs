//! Skill experience tables, level derivation and combat level.
//!
//! The XP curve is the classic one: the experience needed for level `L` is
//! `floor(sum(n + 300 * 2^(n / 7) for n in 1..L) / 4)`. It is stored as a
//! precomputed constant so no floating-point work happens at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Highest attainable level in any skill.
pub const MAX_LEVEL: u8 = 99;

/// Experience cap per skill.
pub const MAX_XP: u32 = 200_000_000;

/// Total experience required to reach each level, indexed by `level - 1`.
pub const XP_TABLE: [u32; MAX_LEVEL as usize] = [
    0, 83, 174, 276, 388, 512, 650, 801, 969, 1_154, // 1-10
    1_358, 1_584, 1_833, 2_107, 2_411, 2_746, 3_115, 3_523, 3_973, 4_470, // 11-20
    5_018, 5_624, 6_291, 7_028, 7_842, 8_740, 9_730, 10_824, 12_031, 13_363, // 21-30
    14_833, 16_456, 18_247, 20_224, 22_406, 24_815, 27_473, 30_408, 33_648, 37_224, // 31-40
    41_171, 45_529, 50_339, 55_649, 61_512, 67_983, 75_127, 83_014, 91_721, 101_333, // 41-50
    111_945, 123_660, 136_594, 150_872, 166_636, 184_040, 203_254, 224_466, 247_886,
    273_742, // 51-60
    302_288, 333_804, 368_599, 407_015, 449_428, 496_254, 547_953, 605_032, 668_051,
    737_627, // 61-70
    814_445, 899_257, 992_895, 1_096_278, 1_210_421, 1_336_443, 1_475_581, 1_629_200, 1_798_808,
    1_986_068, // 71-80
    2_192_818, 2_421_087, 2_673_114, 2_951_373, 3_258_594, 3_597_792, 3_972_294, 4_385_776,
    4_842_295, 5_346_332, // 81-90
    5_902_831, 6_517_253, 7_195_629, 7_944_614, 8_771_558, 9_684_577, 10_692_629, 11_805_606,
    13_034_431, // 91-99
];

/// Experience required to reach `level`. Levels outside 1..=99 are clamped.
#[must_use]
pub fn xp_for_level(level: u8) -> u32 {
    let level = level.clamp(1, MAX_LEVEL);
    XP_TABLE[usize::from(level - 1)]
}

/// Highest level whose experience requirement `xp` meets.
#[must_use]
pub fn level_for_xp(xp: u32) -> u8 {
    // Number of table entries <= xp; entry 0 is 0 so this is at least 1.
    let reached = XP_TABLE.partition_point(|&required| required <= xp);
    reached.max(1) as u8
}

/// Experience still needed for the next level, or 0 at the maximum level.
#[must_use]
pub fn xp_to_next_level(xp: u32) -> u32 {
    let level = level_for_xp(xp);
    if level >= MAX_LEVEL {
        return 0;
    }
    xp_for_level(level + 1) - xp
}

/// Every trainable skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Melee accuracy.
    Attack,
    /// Melee max hit.
    Strength,
    /// Defensive rolls against every style.
    Defense,
    /// Ranged accuracy and damage.
    Ranged,
    /// Magic accuracy.
    Magic,
    /// Life points.
    Hitpoints,
    /// Prayer points.
    Prayer,
    /// Chopping trees.
    Woodcutting,
    /// Catching fish.
    Fishing,
    /// Lighting fires.
    Firemaking,
    /// Cooking food.
    Cooking,
}

impl Skill {
    /// All skills in display order.
    pub const ALL: [Skill; 11] = [
        Skill::Attack,
        Skill::Strength,
        Skill::Defense,
        Skill::Ranged,
        Skill::Magic,
        Skill::Hitpoints,
        Skill::Prayer,
        Skill::Woodcutting,
        Skill::Fishing,
        Skill::Firemaking,
        Skill::Cooking,
    ];

    /// Static definition for this skill.
    #[must_use]
    pub const fn definition(self) -> SkillDefinition {
        match self {
            Skill::Attack | Skill::Strength | Skill::Defense | Skill::Ranged => {
                SkillDefinition::combat(4, 100)
            }
            Skill::Magic => SkillDefinition::combat(2, 100),
            Skill::Hitpoints => SkillDefinition::combat(1, 133),
            Skill::Prayer => SkillDefinition::combat(1, 100),
            Skill::Woodcutting => SkillDefinition::gathering(25),
            Skill::Fishing => SkillDefinition::gathering(10),
            Skill::Firemaking => SkillDefinition::gathering(40),
            Skill::Cooking => SkillDefinition::gathering(30),
        }
    }
}

/// Static properties of a skill.
///
/// `base_xp` and `multiplier_percent` are consumed by whatever grants
/// experience; this module never applies them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Whether the skill feeds into combat level.
    pub is_combat: bool,
    /// Level cap.
    pub max_level: u8,
    /// Experience granted per unit action (per damage point for combat).
    pub base_xp: u32,
    /// Experience multiplier in percent (hitpoints uses 133).
    pub multiplier_percent: u32,
}

impl SkillDefinition {
    const fn combat(base_xp: u32, multiplier_percent: u32) -> Self {
        Self {
            is_combat: true,
            max_level: MAX_LEVEL,
            base_xp,
            multiplier_percent,
        }
    }

    const fn gathering(base_xp: u32) -> Self {
        Self {
            is_combat: false,
            max_level: MAX_LEVEL,
            base_xp,
            multiplier_percent: 100,
        }
    }
}

/// Experience held in one skill. The level is always derived from `xp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SkillState {
    xp: u32,
}

/// A level threshold crossed by [`SkillState::gain_xp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    /// Level before the experience was added.
    pub from: u8,
    /// Level after the experience was added.
    pub to: u8,
}

impl SkillState {
    /// State holding `xp` experience (capped at [`MAX_XP`]).
    #[must_use]
    pub fn from_xp(xp: u32) -> Self {
        Self { xp: xp.min(MAX_XP) }
    }

    /// State at the start of `level`.
    #[must_use]
    pub fn at_level(level: u8) -> Self {
        Self::from_xp(xp_for_level(level))
    }

    /// Total experience.
    #[must_use]
    pub const fn xp(self) -> u32 {
        self.xp
    }

    /// Current level.
    #[must_use]
    pub fn level(self) -> u8 {
        level_for_xp(self.xp)
    }

    /// Experience left until the next level.
    #[must_use]
    pub fn xp_to_next_level(self) -> u32 {
        xp_to_next_level(self.xp)
    }

    /// Add experience, reporting a level change if one happened.
    pub fn gain_xp(&mut self, amount: u32) -> Option<LevelUp> {
        let from = self.level();
        self.xp = self.xp.saturating_add(amount).min(MAX_XP);
        let to = self.level();
        (to > from).then_some(LevelUp { from, to })
    }
}

/// Raw levels used by the combat level formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatLevels {
    /// Attack level.
    pub attack: u32,
    /// Strength level.
    pub strength: u32,
    /// Defence level.
    pub defence: u32,
    /// Hitpoints level.
    pub hitpoints: u32,
    /// Prayer level.
    pub prayer: u32,
    /// Ranged level.
    pub ranged: u32,
    /// Magic level.
    pub magic: u32,
}

impl Default for CombatLevels {
    /// A fresh character: every combat skill at 1, hitpoints at 10.
    fn default() -> Self {
        Self {
            attack: 1,
            strength: 1,
            defence: 1,
            hitpoints: 10,
            prayer: 1,
            ranged: 1,
            magic: 1,
        }
    }
}

/// Combat level from combat skill levels.
///
/// `floor(base + max(melee, range, mage))` with
/// `base = 0.25 * (defence + hitpoints + prayer / 2)` and each offensive
/// term `0.325 * (...)`. Both coefficients are exact in fortieths
/// (10/40 and 13/40), so the whole sum is evaluated in integers.
#[must_use]
pub fn combat_level(levels: CombatLevels) -> u32 {
    let base = 10 * (levels.defence + levels.hitpoints + levels.prayer / 2);
    let melee = 13 * (levels.attack + levels.strength);
    let range = 13 * (levels.ranged + levels.ranged / 2);
    let mage = 13 * (levels.magic + levels.magic / 2);

    (base + melee.max(range).max(mage)) / 40
}

/// Experience across every skill a character has trained.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillSet {
    skills: BTreeMap<Skill, SkillState>,
}

impl SkillSet {
    /// Empty skill set; every skill reads as untrained.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper setting a skill to the start of `level`.
    #[must_use]
    pub fn with_level(mut self, skill: Skill, level: u8) -> Self {
        self.skills.insert(skill, SkillState::at_level(level));
        self
    }

    /// Stored state for a skill, if it has one.
    #[must_use]
    pub fn get(&self, skill: Skill) -> Option<SkillState> {
        self.skills.get(&skill).copied()
    }

    /// Level in a skill, if it has been recorded.
    #[must_use]
    pub fn level(&self, skill: Skill) -> Option<u8> {
        self.get(skill).map(SkillState::level)
    }

    /// Grant experience to a skill, creating it if needed.
    pub fn gain_xp(&mut self, skill: Skill, amount: u32) -> Option<LevelUp> {
        let initial = match skill {
            Skill::Hitpoints => SkillState::at_level(10),
            _ => SkillState::default(),
        };
        self.skills.entry(skill).or_insert(initial).gain_xp(amount)
    }

    /// Combat levels with defaults for skills that were never recorded.
    #[must_use]
    pub fn combat_levels(&self) -> CombatLevels {
        let defaults = CombatLevels::default();
        let level = |skill, fallback: u32| self.level(skill).map_or(fallback, u32::from);
        CombatLevels {
            attack: level(Skill::Attack, defaults.attack),
            strength: level(Skill::Strength, defaults.strength),
            defence: level(Skill::Defense, defaults.defence),
            hitpoints: level(Skill::Hitpoints, defaults.hitpoints),
            prayer: level(Skill::Prayer, defaults.prayer),
            ranged: level(Skill::Ranged, defaults.ranged),
            magic: level(Skill::Magic, defaults.magic),
        }
    }

    /// Combat level of this character.
    #[must_use]
    pub fn combat_level(&self) -> u32 {
        combat_level(self.combat_levels())
    }

    /// Sum of all recorded levels.
    #[must_use]
    pub fn total_level(&self) -> u32 {
        Skill::ALL
            .iter()
            .map(|&skill| u32::from(self.level(skill).unwrap_or(1)))
            .sum()
    }
}
