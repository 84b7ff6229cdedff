//! Type matchup helpers for team-level analysis

use crate::types::Type;

/// Every attacking type that hits the defender super effectively
pub fn weaknesses(defender: &[Type]) -> Vec<Type> {
    Type::ALL
        .iter()
        .copied()
        .filter(|t| t.against_all(defender) > 1.0)
        .collect()
}

/// Every attacking type the defender takes reduced or no damage from
pub fn resistances(defender: &[Type]) -> Vec<Type> {
    Type::ALL
        .iter()
        .copied()
        .filter(|t| t.against_all(defender) < 1.0)
        .collect()
}

/// Whether the defender resists or is immune to the attacking type
pub fn checks(defender: &[Type], attacking: Type) -> bool {
    attacking.against_all(defender) < 1.0
}

/// Attacking types that hit more team members super effectively than the
/// team resists, paired with that surplus.
///
/// Members without known typing are skipped. Output follows chart order.
pub fn shared_weaknesses(members: &[&[Type]]) -> Vec<(Type, u32)> {
    Type::ALL
        .iter()
        .copied()
        .filter_map(|attacking| {
            let mut pressure: i32 = 0;
            for defender in members.iter().filter(|m| !m.is_empty()) {
                let multi = attacking.against_all(defender);
                if multi > 1.0 {
                    pressure += 1;
                } else if multi < 1.0 {
                    pressure -= 1;
                }
            }
            (pressure > 0).then_some((attacking, pressure as u32))
        })
        .collect()
}

/// How well a candidate patches the team's shared weaknesses, in `[-1, 1]`.
///
/// Each shared weakness the candidate checks adds its pressure, each one the
/// candidate is itself weak to subtracts it. Zero when nothing is shared.
pub fn patch_score(candidate: &[Type], shared: &[(Type, u32)]) -> f64 {
    let total: u32 = shared.iter().map(|(_, p)| *p).sum();
    if total == 0 || candidate.is_empty() {
        return 0.0;
    }

    let net: i64 = shared
        .iter()
        .map(|(attacking, pressure)| {
            let multi = attacking.against_all(candidate);
            if multi < 1.0 {
                i64::from(*pressure)
            } else if multi > 1.0 {
                -i64::from(*pressure)
            } else {
                0
            }
        })
        .sum();

    net as f64 / f64::from(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weaknesses_dual_type() {
        // Water/Ground only fears Grass
        assert_eq!(weaknesses(&[Type::Water, Type::Ground]), vec![Type::Grass]);
    }

    #[test]
    fn test_resistances_include_immunities() {
        let ghost = resistances(&[Type::Ghost]);
        assert!(ghost.contains(&Type::Normal));
        assert!(ghost.contains(&Type::Fighting));
        assert!(ghost.contains(&Type::Poison));
        assert!(!ghost.contains(&Type::Dark));
    }

    #[test]
    fn test_checks() {
        assert!(checks(&[Type::Steel], Type::Fairy));
        assert!(checks(&[Type::Ground], Type::Electric));
        assert!(!checks(&[Type::Water], Type::Electric));
    }

    #[test]
    fn test_shared_weaknesses_counts_surplus() {
        let water: &[Type] = &[Type::Water];
        let flying: &[Type] = &[Type::Normal, Type::Flying];
        let shared = shared_weaknesses(&[water, flying]);

        // both weak to Electric, nothing on the team resists it
        assert!(shared.contains(&(Type::Electric, 2)));
        // Water weak to Grass but Flying resists it
        assert!(!shared.iter().any(|(t, _)| *t == Type::Grass));
    }

    #[test]
    fn test_shared_weaknesses_skips_unknown_members() {
        let water: &[Type] = &[Type::Water];
        let unknown: &[Type] = &[];
        assert_eq!(
            shared_weaknesses(&[water, unknown]),
            shared_weaknesses(&[water])
        );
    }

    #[test]
    fn test_patch_score() {
        let shared = vec![(Type::Electric, 2), (Type::Grass, 1)];

        // Ground is immune to Electric but weak to Grass
        let ground = patch_score(&[Type::Ground], &shared);
        assert!((ground - (2.0 - 1.0) / 3.0).abs() < 1e-9);

        // Grass/Dragon checks both
        let dragon = patch_score(&[Type::Grass, Type::Dragon], &shared);
        assert!((dragon - 1.0).abs() < 1e-9);

        assert_eq!(patch_score(&[Type::Normal], &[]), 0.0);
    }
}
