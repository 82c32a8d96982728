//! Membership values and the tier state machine.
//!
//! Memberships are immutable with respect to their tier: a change, a
//! cancellation, or a reactivation builds a new value through
//! [`make_membership`], carrying over only the email and card number.

use crate::membership::tier::Tier;
use crate::membership::validate::{validate_card_number, validate_email};
use crate::SubvaultError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A subscriber's plan plus the tier-specific extras it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    email: String,
    card_number: String,
    tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gift_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offline_content_count: Option<u32>,
}

/// Outcome of [`Membership::change_tier`].
///
/// An illegal target is not an error: the current membership comes back
/// untouched as `Unchanged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierChange {
    /// The target was legal; holds the new membership.
    Changed(Membership),
    /// The target was rejected; holds the original membership.
    Unchanged(Membership),
}

impl TierChange {
    /// Whether the tier actually changed.
    pub fn is_changed(&self) -> bool {
        matches!(self, TierChange::Changed(_))
    }

    /// The resulting membership either way.
    pub fn membership(&self) -> &Membership {
        match self {
            TierChange::Changed(m) | TierChange::Unchanged(m) => m,
        }
    }

    /// Consume into the resulting membership.
    pub fn into_membership(self) -> Membership {
        match self {
            TierChange::Changed(m) | TierChange::Unchanged(m) => m,
        }
    }
}

/// Build a fresh membership of `tier` with that tier's starting extras.
pub fn make_membership(tier: Tier, email: String, card_number: String) -> Membership {
    Membership {
        email,
        card_number,
        tier,
        gift_days: tier.gift_days(),
        offline_content_count: tier.has_offline_content().then_some(0),
    }
}

impl Membership {
    /// Validate the subscriber fields and build a membership.
    pub fn new(
        tier: Tier,
        email: impl Into<String>,
        card_number: impl Into<String>,
    ) -> Result<Self, SubvaultError> {
        let email = email.into();
        let card_number = card_number.into();
        validate_email(&email)?;
        validate_card_number(&card_number)?;
        Ok(make_membership(tier, email, card_number))
    }

    /// Subscriber email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Sixteen-digit card number.
    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    /// Current tier.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Device limit of the current tier.
    pub fn devices(&self) -> u32 {
        self.tier.devices()
    }

    /// Cost of the current tier.
    pub fn cost(&self) -> u32 {
        self.tier.cost()
    }

    /// Gift days, for tiers that grant them.
    pub fn gift_days(&self) -> Option<u32> {
        self.gift_days
    }

    /// Offline content count, for tiers that track it.
    pub fn offline_content_count(&self) -> Option<u32> {
        self.offline_content_count
    }

    /// Move to the tier with `target_id` if the change-tier table allows it.
    pub fn change_tier(&self, target_id: u8) -> TierChange {
        match Tier::from_target_id(target_id) {
            Some(target) if self.tier.can_transition_to(target) => {
                debug!(from = %self.tier, to = %target, "tier changed");
                TierChange::Changed(make_membership(
                    target,
                    self.email.clone(),
                    self.card_number.clone(),
                ))
            }
            _ => {
                debug!(from = %self.tier, target_id, "tier change rejected");
                TierChange::Unchanged(self.clone())
            }
        }
    }

    /// Fall back to Free, dropping tier extras. Free stays Free.
    pub fn cancel(&self) -> Membership {
        if self.tier == Tier::Free {
            return self.clone();
        }
        make_membership(Tier::Free, self.email.clone(), self.card_number.clone())
    }

    /// Start over on any paid tier, ignoring the change-tier table.
    ///
    /// Returns `None` when `target_id` is not 1..=4.
    pub fn reactivate(&self, target_id: u8) -> Option<Membership> {
        Tier::from_target_id(target_id)
            .map(|tier| make_membership(tier, self.email.clone(), self.card_number.clone()))
    }

    /// Record a parental-control change. Family and Pro only.
    pub fn modify_parental_control(&self) -> Result<(), SubvaultError> {
        if !self.tier.has_parental_control() {
            return Err(SubvaultError::Capability {
                tier: self.tier,
                capability: "parental control",
            });
        }
        info!(email = %self.email, tier = %self.tier, "parental control modified");
        Ok(())
    }

    /// Raise the offline content allowance by one. Offline and Pro only.
    pub fn increment_offline_content(&mut self) -> Result<u32, SubvaultError> {
        let count = match (self.tier.has_offline_content(), self.offline_content_count.as_mut()) {
            (true, Some(count)) => count,
            _ => {
                return Err(SubvaultError::Capability {
                    tier: self.tier,
                    capability: "offline content",
                })
            }
        };
        *count = count.checked_add(1).ok_or_else(|| SubvaultError::Validation {
            field: "offline content",
            reason: "allowance is already at its maximum".to_string(),
        })?;
        info!(tier = %self.tier, count = *count, "offline content increased");
        Ok(*count)
    }

    /// Check field and extras invariants, e.g. after deserialization.
    pub fn check_invariants(&self) -> Result<(), SubvaultError> {
        validate_email(&self.email)?;
        validate_card_number(&self.card_number)?;
        if self.gift_days.is_some() != self.tier.gift_days().is_some() {
            return Err(SubvaultError::Validation {
                field: "gift days",
                reason: format!("not applicable to {} memberships", self.tier),
            });
        }
        if self.offline_content_count.is_some() != self.tier.has_offline_content() {
            return Err(SubvaultError::Validation {
                field: "offline content",
                reason: format!("not applicable to {} memberships", self.tier),
            });
        }
        Ok(())
    }
}
