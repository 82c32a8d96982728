//! Membership tiers, their metadata, and the legal change-tier table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A membership plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// No-cost plan every cancelled membership falls back to.
    Free,
    /// Entry paid plan.
    Basic,
    /// Family plan with parental controls.
    Family,
    /// Plan with downloadable offline content.
    Offline,
    /// Family and offline features combined.
    Pro,
}

impl Tier {
    /// Tiers selectable by target id, in id order.
    pub const PAID: [Tier; 4] = [Tier::Basic, Tier::Family, Tier::Offline, Tier::Pro];

    /// Numeric id shown in menus. Free is 0 and never a valid target.
    pub fn id(self) -> u8 {
        match self {
            Tier::Free => 0,
            Tier::Basic => 1,
            Tier::Family => 2,
            Tier::Offline => 3,
            Tier::Pro => 4,
        }
    }

    /// Resolve a target id (1=Basic, 2=Family, 3=Offline, 4=Pro).
    pub fn from_target_id(id: u8) -> Option<Tier> {
        Tier::PAID.into_iter().find(|tier| tier.id() == id)
    }

    /// Monthly cost.
    pub fn cost(self) -> u32 {
        match self {
            Tier::Free => 0,
            Tier::Basic => 3000,
            Tier::Family => 5000,
            Tier::Offline => 3500,
            Tier::Pro => 7000,
        }
    }

    /// Number of devices allowed.
    pub fn devices(self) -> u32 {
        match self {
            Tier::Free => 1,
            Tier::Basic => 2,
            Tier::Family => 5,
            Tier::Offline => 2,
            Tier::Pro => 6,
        }
    }

    /// Gift days granted when a membership of this tier is created.
    pub fn gift_days(self) -> Option<u32> {
        match self {
            Tier::Family | Tier::Offline => Some(7),
            Tier::Pro => Some(15),
            Tier::Free | Tier::Basic => None,
        }
    }

    /// Whether parental controls can be modified.
    pub fn has_parental_control(self) -> bool {
        matches!(self, Tier::Family | Tier::Pro)
    }

    /// Whether offline content is tracked.
    pub fn has_offline_content(self) -> bool {
        matches!(self, Tier::Offline | Tier::Pro)
    }

    /// Tiers reachable from `self` through a tier change.
    pub fn allowed_targets(self) -> &'static [Tier] {
        match self {
            Tier::Free => &[Tier::Basic, Tier::Family, Tier::Offline, Tier::Pro],
            Tier::Basic => &[Tier::Family, Tier::Offline, Tier::Pro],
            Tier::Family => &[Tier::Basic, Tier::Offline, Tier::Pro],
            Tier::Offline => &[Tier::Basic, Tier::Family, Tier::Pro],
            Tier::Pro => &[Tier::Basic, Tier::Family, Tier::Offline],
        }
    }

    /// Whether a tier change from `self` to `target` is legal.
    pub fn can_transition_to(self, target: Tier) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Basic => "Basic",
            Tier::Family => "Family",
            Tier::Offline => "Offline",
            Tier::Pro => "Pro",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_ids() {
        assert_eq!(Tier::from_target_id(1), Some(Tier::Basic));
        assert_eq!(Tier::from_target_id(2), Some(Tier::Family));
        assert_eq!(Tier::from_target_id(3), Some(Tier::Offline));
        assert_eq!(Tier::from_target_id(4), Some(Tier::Pro));
        assert_eq!(Tier::from_target_id(0), None);
        assert_eq!(Tier::from_target_id(5), None);
    }

    #[test]
    fn test_metadata() {
        let expected = [
            (Tier::Free, 0, 1),
            (Tier::Basic, 3000, 2),
            (Tier::Family, 5000, 5),
            (Tier::Offline, 3500, 2),
            (Tier::Pro, 7000, 6),
        ];
        for (tier, cost, devices) in expected {
            assert_eq!(tier.cost(), cost, "{tier} cost");
            assert_eq!(tier.devices(), devices, "{tier} devices");
        }
    }

    #[test]
    fn test_capabilities() {
        assert!(Tier::Family.has_parental_control());
        assert!(Tier::Pro.has_parental_control());
        assert!(!Tier::Offline.has_parental_control());
        assert!(Tier::Offline.has_offline_content());
        assert!(Tier::Pro.has_offline_content());
        assert!(!Tier::Family.has_offline_content());
        assert!(!Tier::Free.has_parental_control());
        assert!(!Tier::Basic.has_offline_content());
    }

    #[test]
    fn test_no_self_transitions() {
        for tier in [Tier::Free, Tier::Basic, Tier::Family, Tier::Offline, Tier::Pro] {
            assert!(!tier.can_transition_to(tier), "{tier} -> {tier}");
            assert!(!tier.can_transition_to(Tier::Free), "{tier} -> Free");
        }
    }

    #[test]
    fn test_basic_and_pro_edges() {
        assert!(!Tier::Basic.can_transition_to(Tier::Basic));
        assert!(Tier::Basic.can_transition_to(Tier::Pro));
        assert!(Tier::Pro.can_transition_to(Tier::Basic));
    }
}
