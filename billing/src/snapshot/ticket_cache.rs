use crate::pda::PayoutSlot;
use crate::state::PayoutTicket;

use solana_program::pubkey::Pubkey;

use std::collections::HashMap;

type HashedSlots = HashMap<PayoutSlot, PayoutTicket>;

/// Caches payout tickets between reconciliations.
///
/// Tickets are immutable once created, so only slots without a ticket need
/// to be queried again.
#[derive(Debug, Default)]
pub struct PayoutTicketCache {
    /// Found tickets of each auction manager
    by_manager: HashMap<Pubkey, HashedSlots>,
}

impl PayoutTicketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, auction_manager: &Pubkey, slot: &PayoutSlot) -> bool {
        self.by_manager
            .get(auction_manager)
            .map(|slots| slots.contains_key(slot))
            .unwrap_or(false)
    }

    /// Slots that have no ticket cached yet, in the given order.
    pub fn missing<'a>(
        &self,
        auction_manager: &Pubkey,
        slots: &'a [PayoutSlot],
    ) -> Vec<&'a PayoutSlot> {
        slots
            .iter()
            .filter(|slot| !self.contains(auction_manager, slot))
            .collect()
    }

    /// Registers a found ticket. A slot that is already cached keeps its
    /// ticket.
    pub fn insert(&mut self, auction_manager: Pubkey, slot: PayoutSlot, ticket: PayoutTicket) {
        let slots = self.by_manager.entry(auction_manager).or_default();
        slots.entry(slot).or_insert(ticket);
    }

    /// Cached tickets of the given slots, in slot order.
    pub fn tickets(&self, auction_manager: &Pubkey, slots: &[PayoutSlot]) -> Vec<PayoutTicket> {
        let cached = match self.by_manager.get(auction_manager) {
            Some(cached) => cached,
            None => return Vec::new(),
        };
        slots
            .iter()
            .filter_map(|slot| cached.get(slot))
            .cloned()
            .collect()
    }

    /// Number of cached tickets across all auction managers.
    pub fn len(&self) -> usize {
        self.by_manager.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::PAYOUT_TICKET_KEY;

    fn slot(creator_index: Option<usize>) -> PayoutSlot {
        PayoutSlot {
            winning_config_index: Some(0),
            winning_config_item_index: Some(0),
            creator_index,
            safety_deposit: Pubkey::new_unique(),
            recipient: Pubkey::new_unique(),
        }
    }

    fn ticket(amount_paid: u64) -> PayoutTicket {
        PayoutTicket {
            key: PAYOUT_TICKET_KEY,
            recipient: Pubkey::new_unique(),
            amount_paid,
        }
    }

    #[test]
    fn cached_slots_are_not_missing() {
        let manager = Pubkey::new_unique();
        let other_manager = Pubkey::new_unique();
        let slots = vec![slot(Some(0)), slot(None)];
        let mut cache = PayoutTicketCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.missing(&manager, &slots).len(), 2);

        cache.insert(manager, slots[1].clone(), ticket(20));
        assert_eq!(cache.missing(&manager, &slots), vec![&slots[0]]);
        // caches are kept apart per auction manager
        assert_eq!(cache.missing(&other_manager, &slots).len(), 2);

        // an existing ticket is never replaced
        cache.insert(manager, slots[1].clone(), ticket(99));
        assert_eq!(cache.tickets(&manager, &slots)[0].amount_paid, 20);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn tickets_follow_slot_order() {
        let manager = Pubkey::new_unique();
        let slots = vec![slot(Some(0)), slot(Some(1)), slot(None)];
        let mut cache = PayoutTicketCache::new();
        cache.insert(manager, slots[2].clone(), ticket(3));
        cache.insert(manager, slots[0].clone(), ticket(1));

        let amounts: Vec<u64> = cache
            .tickets(&manager, &slots)
            .iter()
            .map(|ticket| ticket.amount_paid)
            .collect();
        assert_eq!(amounts, vec![1, 3]);
        assert!(cache.tickets(&Pubkey::new_unique(), &slots).is_empty());
    }
}
