//! Active and inactive client collections.
//!
//! Every client lives in exactly one of the two collections. Operations that
//! move a client validate their inputs before touching either collection, so
//! a failed call leaves the ledger as it was.

use crate::membership::{Membership, TierChange};
use crate::SubvaultError;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A named subscriber and their membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Display name.
    pub full_name: String,
    /// Current membership.
    pub membership: Membership,
}

impl Client {
    /// Pair a name with a membership.
    pub fn new(full_name: impl Into<String>, membership: Membership) -> Self {
        Self {
            full_name: full_name.into(),
            membership,
        }
    }
}

/// Ordered active and inactive clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    active: Vec<Client>,
    inactive: Vec<Client>,
}

impl Ledger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from previously persisted collections.
    pub fn from_parts(active: Vec<Client>, inactive: Vec<Client>) -> Self {
        Self { active, inactive }
    }

    /// Active clients in registration order.
    pub fn active(&self) -> &[Client] {
        &self.active
    }

    /// Inactive clients in cancellation order.
    pub fn inactive(&self) -> &[Client] {
        &self.inactive
    }

    /// Total number of clients.
    pub fn len(&self) -> usize {
        self.active.len() + self.inactive.len()
    }

    /// Whether both collections are empty.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.inactive.is_empty()
    }

    /// Append a new client to the active collection.
    pub fn register_client(&mut self, full_name: impl Into<String>, membership: Membership) {
        let client = Client::new(full_name, membership);
        info!(tier = %client.membership.tier(), "client registered");
        self.active.push(client);
    }

    /// Change an active client's tier in place.
    ///
    /// An illegal target leaves the client as is and returns
    /// [`TierChange::Unchanged`].
    pub fn change_tier(&mut self, index: usize, target_id: u8) -> Result<TierChange, SubvaultError> {
        let client = self
            .active
            .get_mut(index)
            .ok_or(SubvaultError::ClientNotFound {
                collection: "active",
                index,
            })?;

        let change = client.membership.change_tier(target_id);
        if let TierChange::Changed(ref membership) = change {
            client.membership = membership.clone();
        }
        Ok(change)
    }

    /// Move an active client to the inactive collection on the Free tier.
    pub fn cancel(&mut self, index: usize) -> Result<(), SubvaultError> {
        let cancelled = self
            .active
            .get(index)
            .map(|client| client.membership.cancel())
            .ok_or(SubvaultError::ClientNotFound {
                collection: "active",
                index,
            })?;

        let mut client = self.active.remove(index);
        client.membership = cancelled;
        info!(index, "membership cancelled");
        self.inactive.push(client);
        Ok(())
    }

    /// Move an inactive client back to active on any paid tier.
    ///
    /// Unlike [`Ledger::change_tier`], the change-tier table does not apply.
    pub fn reactivate(&mut self, index: usize, target_id: u8) -> Result<(), SubvaultError> {
        let client = self.inactive.get(index).ok_or(SubvaultError::ClientNotFound {
            collection: "inactive",
            index,
        })?;
        let fresh = client
            .membership
            .reactivate(target_id)
            .ok_or(SubvaultError::InvalidTier(target_id))?;

        let mut client = self.inactive.remove(index);
        client.membership = fresh;
        info!(index, tier = %client.membership.tier(), "client reactivated");
        self.active.push(client);
        Ok(())
    }

    /// Record a parental-control change for an active client.
    pub fn modify_parental_control(&self, index: usize) -> Result<(), SubvaultError> {
        self.active
            .get(index)
            .ok_or(SubvaultError::ClientNotFound {
                collection: "active",
                index,
            })?
            .membership
            .modify_parental_control()
    }

    /// Raise an active client's offline content allowance.
    pub fn increment_offline_content(&mut self, index: usize) -> Result<u32, SubvaultError> {
        self.active
            .get_mut(index)
            .ok_or(SubvaultError::ClientNotFound {
                collection: "active",
                index,
            })?
            .membership
            .increment_offline_content()
    }

    /// Check every membership's invariants.
    pub fn check_invariants(&self) -> Result<(), SubvaultError> {
        self.active
            .iter()
            .chain(&self.inactive)
            .try_for_each(|client| client.membership.check_invariants())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::Tier;
    use proptest::prelude::*;

    fn membership(tier: Tier, email: &str) -> Membership {
        Membership::new(tier, email, "1111222233334444").unwrap()
    }

    fn sample() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.register_client("Ana Pérez", membership(Tier::Pro, "ana@mail.com"));
        ledger.register_client("Luis Soto", membership(Tier::Basic, "luis@mail.com"));
        ledger
    }

    fn emails(clients: &[Client]) -> Vec<&str> {
        clients.iter().map(|c| c.membership.email()).collect()
    }

    #[test]
    fn test_register_appends_in_order() {
        let ledger = sample();
        assert_eq!(emails(ledger.active()), ["ana@mail.com", "luis@mail.com"]);
        assert!(ledger.inactive().is_empty());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_change_tier_in_place() {
        let mut ledger = sample();
        let change = ledger.change_tier(1, 4).unwrap();
        assert!(change.is_changed());
        assert_eq!(ledger.active()[1].membership.tier(), Tier::Pro);
        assert_eq!(ledger.active()[1].full_name, "Luis Soto");
    }

    #[test]
    fn test_change_tier_rejected_keeps_entry() {
        let mut ledger = sample();
        let before = ledger.clone();
        let change = ledger.change_tier(0, 4).unwrap();
        assert!(!change.is_changed());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_change_tier_bad_index() {
        let mut ledger = sample();
        assert!(matches!(
            ledger.change_tier(2, 1),
            Err(SubvaultError::ClientNotFound {
                collection: "active",
                index: 2
            })
        ));
    }

    #[test]
    fn test_cancel_moves_to_inactive() {
        let mut ledger = sample();
        ledger.cancel(0).unwrap();

        assert_eq!(emails(ledger.active()), ["luis@mail.com"]);
        assert_eq!(emails(ledger.inactive()), ["ana@mail.com"]);
        assert_eq!(ledger.inactive()[0].membership.tier(), Tier::Free);
        assert_eq!(ledger.inactive()[0].full_name, "Ana Pérez");
    }

    #[test]
    fn test_cancel_bad_index_leaves_ledger() {
        let mut ledger = sample();
        let before = ledger.clone();
        assert!(ledger.cancel(5).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_reactivate() {
        let mut ledger = sample();
        ledger.cancel(1).unwrap();
        ledger.reactivate(0, 1).unwrap();

        assert!(ledger.inactive().is_empty());
        assert_eq!(emails(ledger.active()), ["ana@mail.com", "luis@mail.com"]);
        assert_eq!(ledger.active()[1].membership.tier(), Tier::Basic);
    }

    #[test]
    fn test_reactivate_bad_target_leaves_ledger() {
        let mut ledger = sample();
        ledger.cancel(0).unwrap();
        let before = ledger.clone();

        assert!(matches!(
            ledger.reactivate(0, 9),
            Err(SubvaultError::InvalidTier(9))
        ));
        assert!(matches!(
            ledger.reactivate(3, 1),
            Err(SubvaultError::ClientNotFound {
                collection: "inactive",
                ..
            })
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_every_client_in_exactly_one_collection() {
        let mut ledger = Ledger::new();
        for (i, tier) in [Tier::Basic, Tier::Family, Tier::Offline, Tier::Pro]
            .into_iter()
            .enumerate()
        {
            ledger.register_client(format!("Client {i}"), membership(tier, &format!("c{i}@mail.com")));
        }

        ledger.cancel(2).unwrap();
        ledger.change_tier(0, 3).unwrap();
        ledger.cancel(0).unwrap();
        ledger.reactivate(1, 2).unwrap();
        ledger.change_tier(5, 1).unwrap_err();
        ledger.cancel(1).unwrap();

        let mut seen: Vec<&str> = emails(ledger.active());
        seen.extend(emails(ledger.inactive()));
        seen.sort();
        assert_eq!(
            seen,
            ["c0@mail.com", "c1@mail.com", "c2@mail.com", "c3@mail.com"]
        );
        assert_eq!(ledger.len(), 4);
    }

    #[test]
    fn test_capabilities_through_ledger() {
        let mut ledger = sample();
        assert!(ledger.modify_parental_control(0).is_ok());
        assert!(ledger.modify_parental_control(1).is_err());
        assert_eq!(ledger.increment_offline_content(0).unwrap(), 1);
        assert!(ledger.increment_offline_content(1).is_err());
        assert!(ledger.increment_offline_content(7).is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register(u8),
        ChangeTier(usize, u8),
        Cancel(usize),
        Reactivate(usize, u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u8..=4).prop_map(Op::Register),
            (0usize..6, 0u8..6).prop_map(|(i, t)| Op::ChangeTier(i, t)),
            (0usize..6).prop_map(Op::Cancel),
            (0usize..6, 0u8..6).prop_map(|(i, t)| Op::Reactivate(i, t)),
        ]
    }

    proptest! {
        #[test]
        fn prop_clients_never_lost_or_duplicated(ops in proptest::collection::vec(op(), 0..40)) {
            let mut ledger = Ledger::new();
            let mut registered = Vec::new();

            for op in ops {
                let before = ledger.clone();
                let result = match op {
                    Op::Register(id) => {
                        let email = format!("c{}@mail.com", registered.len());
                        let tier = Tier::from_target_id(id).unwrap();
                        ledger.register_client("Client", membership(tier, &email));
                        registered.push(email);
                        Ok(())
                    }
                    Op::ChangeTier(i, t) => ledger.change_tier(i, t).map(|_| ()),
                    Op::Cancel(i) => ledger.cancel(i),
                    Op::Reactivate(i, t) => ledger.reactivate(i, t),
                };
                if result.is_err() {
                    prop_assert_eq!(&ledger, &before);
                }
            }

            let mut seen: Vec<String> = ledger
                .active()
                .iter()
                .chain(ledger.inactive())
                .map(|c| c.membership.email().to_string())
                .collect();
            seen.sort();
            registered.sort();
            prop_assert_eq!(seen, registered);
            prop_assert!(ledger.inactive().iter().all(|c| c.membership.tier() == Tier::Free));
            prop_assert!(ledger.check_invariants().is_ok());
        }
    }
}
