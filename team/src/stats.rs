//! Stat investment (EVs / IVs)

use serde::{Deserialize, Serialize};

/// Max EVs in a single stat
pub const MAX_STAT_EVS: u16 = 252;
/// Max EVs across all stats
pub const MAX_TOTAL_EVS: u16 = 510;
/// Max (and default) IV
pub const MAX_IV: u16 = 31;

/// The six permanent stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Hp,
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
}

impl Stat {
    /// Export order
    pub const ALL: [Stat; 6] = [Stat::Hp, Stat::Atk, Stat::Def, Stat::Spa, Stat::Spd, Stat::Spe];

    /// Label used in `EVs:` / `IVs:` lines
    pub fn label(&self) -> &'static str {
        match self {
            Stat::Hp => "HP",
            Stat::Atk => "Atk",
            Stat::Def => "Def",
            Stat::Spa => "SpA",
            Stat::Spd => "SpD",
            Stat::Spe => "Spe",
        }
    }

    /// Case-insensitive label lookup
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|stat| stat.label().eq_ignore_ascii_case(s.trim()))
    }
}

/// One value per stat; used for both EVs and IVs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSpread {
    pub hp: u16,
    pub atk: u16,
    pub def: u16,
    pub spa: u16,
    pub spd: u16,
    pub spe: u16,
}

impl StatSpread {
    /// Every stat set to `value`
    pub const fn uniform(value: u16) -> Self {
        Self {
            hp: value,
            atk: value,
            def: value,
            spa: value,
            spd: value,
            spe: value,
        }
    }

    /// Default EV spread (all zero)
    pub const fn zero_evs() -> Self {
        Self::uniform(0)
    }

    /// Default IV spread (all 31)
    pub const fn max_ivs() -> Self {
        Self::uniform(MAX_IV)
    }

    pub fn get(&self, stat: Stat) -> u16 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Atk => self.atk,
            Stat::Def => self.def,
            Stat::Spa => self.spa,
            Stat::Spd => self.spd,
            Stat::Spe => self.spe,
        }
    }

    pub fn set(&mut self, stat: Stat, value: u16) {
        match stat {
            Stat::Hp => self.hp = value,
            Stat::Atk => self.atk = value,
            Stat::Def => self.def = value,
            Stat::Spa => self.spa = value,
            Stat::Spd => self.spd = value,
            Stat::Spe => self.spe = value,
        }
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, stat: Stat, value: u16) -> Self {
        self.set(stat, value);
        self
    }

    pub fn total(&self) -> u32 {
        Stat::ALL.iter().map(|s| u32::from(self.get(*s))).sum()
    }

    /// Highest single stat value
    pub fn max_stat(&self) -> u16 {
        Stat::ALL.iter().map(|s| self.get(*s)).max().unwrap_or(0)
    }

    /// Render the stats that differ from `default`, e.g. `252 HP / 4 Def`.
    /// Empty when every stat equals the default.
    pub fn describe(&self, default: u16) -> String {
        Stat::ALL
            .iter()
            .filter(|s| self.get(**s) != default)
            .map(|s| format!("{} {}", self.get(*s), s.label()))
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Parse the body of an `EVs:`/`IVs:` line, filling unlisted stats with `default`
    pub fn parse(text: &str, default: u16) -> Option<Self> {
        let mut spread = Self::uniform(default);
        for part in text.split('/') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (value, label) = part.split_once(' ')?;
            let stat = Stat::parse(label)?;
            spread.set(stat, value.trim().parse().ok()?);
        }
        Some(spread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut evs = StatSpread::zero_evs();
        evs.set(Stat::Spe, 252);
        assert_eq!(evs.get(Stat::Spe), 252);
        assert_eq!(evs.get(Stat::Hp), 0);
    }

    #[test]
    fn test_total_and_max() {
        let evs = StatSpread::zero_evs()
            .with(Stat::Atk, 252)
            .with(Stat::Def, 4)
            .with(Stat::Spe, 252);
        assert_eq!(evs.total(), 508);
        assert_eq!(evs.max_stat(), 252);
    }

    #[test]
    fn test_describe_skips_defaults() {
        let evs = StatSpread::zero_evs().with(Stat::Hp, 252).with(Stat::Spd, 4);
        assert_eq!(evs.describe(0), "252 HP / 4 SpD");

        let ivs = StatSpread::max_ivs().with(Stat::Atk, 0);
        assert_eq!(ivs.describe(MAX_IV), "0 Atk");

        assert_eq!(StatSpread::max_ivs().describe(MAX_IV), "");
    }

    #[test]
    fn test_parse() {
        let evs = StatSpread::parse("252 Atk / 4 SpD / 252 Spe", 0).unwrap();
        assert_eq!(evs.atk, 252);
        assert_eq!(evs.spd, 4);
        assert_eq!(evs.spe, 252);
        assert_eq!(evs.hp, 0);

        let ivs = StatSpread::parse("0 atk", MAX_IV).unwrap();
        assert_eq!(ivs.atk, 0);
        assert_eq!(ivs.spe, MAX_IV);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(StatSpread::parse("252 Luck", 0).is_none());
        assert!(StatSpread::parse("lots HP", 0).is_none());
        assert!(StatSpread::parse("252", 0).is_none());
    }
}
