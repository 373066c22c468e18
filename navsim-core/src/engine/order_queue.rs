//! Pending order queue.
//!
//! Tickets are kept in submission order in a `Vec`, so execution order never
//! depends on hash iteration. A new ticket for an instrument replaces any
//! ticket for the same instrument submitted on the same date; cash tickets
//! accumulate instead.

use crate::domain::{AssetId, OrderTicket, OrderType};

#[derive(Debug, Clone, Default)]
pub struct OrderQueue {
    tickets: Vec<OrderTicket>,
}

impl OrderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a ticket, overriding same-instrument same-date submissions.
    ///
    /// Returns the number of tickets that were replaced.
    pub fn submit(&mut self, ticket: OrderTicket) -> usize {
        let before = self.tickets.len();
        if ticket.order_type != OrderType::Cash {
            self.tickets.retain(|t| {
                t.order_type == OrderType::Cash
                    || t.asset != ticket.asset
                    || t.submit_date != ticket.submit_date
            });
        }
        let replaced = before - self.tickets.len();
        self.tickets.push(ticket);
        replaced
    }

    /// Queue a ticket that supersedes every pending ticket for its instrument.
    ///
    /// Returns the superseded tickets.
    pub fn force(&mut self, ticket: OrderTicket) -> Vec<OrderTicket> {
        let superseded = self.take_where(|t| t.asset == ticket.asset);
        self.tickets.push(ticket);
        superseded
    }

    /// Remove and return all tickets matching `pred`, in submission order.
    pub fn take_where(&mut self, pred: impl Fn(&OrderTicket) -> bool) -> Vec<OrderTicket> {
        let (taken, kept): (Vec<_>, Vec<_>) = self.tickets.drain(..).partition(|t| pred(t));
        self.tickets = kept;
        taken
    }

    /// Remove and return everything still queued.
    pub fn drain(&mut self) -> Vec<OrderTicket> {
        std::mem::take(&mut self.tickets)
    }

    pub fn pending(&self) -> &[OrderTicket] {
        &self.tickets
    }

    pub fn has_pending(&self, asset: &AssetId) -> bool {
        self.tickets.iter().any(|t| &t.asset == asset)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
