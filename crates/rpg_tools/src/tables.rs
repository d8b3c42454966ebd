//! Printable reference tables.

use rpg_core::skills::{combat_level, xp_for_level, CombatLevels, MAX_LEVEL};

/// One row of the experience table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpRow {
    /// Level.
    pub level: u8,
    /// Total experience to reach it.
    pub total_xp: u32,
    /// Experience from the previous level.
    pub step_xp: u32,
}

/// Experience table rows for `from..=to`, clamped to valid levels.
#[must_use]
pub fn xp_rows(from: u8, to: u8) -> Vec<XpRow> {
    let from = from.clamp(1, MAX_LEVEL);
    let to = to.clamp(from, MAX_LEVEL);

    (from..=to)
        .map(|level| {
            let total_xp = xp_for_level(level);
            let previous = if level == 1 { 0 } else { xp_for_level(level - 1) };
            XpRow {
                level,
                total_xp,
                step_xp: total_xp - previous,
            }
        })
        .collect()
}

/// Render rows as aligned text.
#[must_use]
pub fn format_xp_rows(rows: &[XpRow]) -> String {
    let mut out = format!("{:>5} {:>12} {:>10}\n", "level", "xp", "step");
    for row in rows {
        out.push_str(&format!(
            "{:>5} {:>12} {:>10}\n",
            row.level, row.total_xp, row.step_xp
        ));
    }
    out
}

/// Combat level with a one-line breakdown of which style dominates.
#[must_use]
pub fn describe_combat_level(levels: CombatLevels) -> String {
    let melee = 13 * (levels.attack + levels.strength);
    let range = 13 * (levels.ranged + levels.ranged / 2);
    let mage = 13 * (levels.magic + levels.magic / 2);

    let style = if melee >= range && melee >= mage {
        "melee"
    } else if range >= mage {
        "ranged"
    } else {
        "magic"
    };
    format!("combat level {} ({style})", combat_level(levels))
}
