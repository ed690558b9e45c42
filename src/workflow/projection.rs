use std::collections::HashMap;

use crate::api::Ticket;

/// Independently changing parts of a ticket. Each has its own ordering, so a
/// support-level response never makes a status response stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Status,
    SupportLevel,
    Assignment,
    /// Title, description, category, priority.
    Details,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 4] = [FieldGroup::Status, FieldGroup::SupportLevel, FieldGroup::Assignment, FieldGroup::Details];

    fn index(self) -> usize {
        match self {
            FieldGroup::Status => 0,
            FieldGroup::SupportLevel => 1,
            FieldGroup::Assignment => 2,
            FieldGroup::Details => 3,
        }
    }

    /// Copy this group's fields from `from` into `into`.
    fn copy(self, from: &Ticket, into: &mut Ticket) {
        match self {
            FieldGroup::Status => into.status = from.status,
            FieldGroup::SupportLevel => into.support_level = from.support_level,
            FieldGroup::Assignment => into.assigned_to_id = from.assigned_to_id.clone(),
            FieldGroup::Details => {
                into.title = from.title.clone();
                into.description = from.description.clone();
                into.category = from.category;
                into.priority = from.priority;
                into.department_id = from.department_id.clone();
            }
        }
    }
}

/// Identifies one in-flight request against one field group of a tracked ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub ticket_id: String,
    pub group: FieldGroup,
    generation: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// A response issued later has already been applied.
    Stale,
    /// The ticket was released (or deleted) while the request was in flight.
    Released,
}

#[derive(Debug)]
struct Tracked {
    ticket: Ticket,
    generation: u64,
    applied_seq: [u64; 4],
}

impl Tracked {
    fn touch(&mut self, from: &Ticket) {
        if from.updated_at > self.ticket.updated_at {
            self.ticket.updated_at = from.updated_at;
        }
    }
}

/// In-memory view of the tickets the UI currently has open.
///
/// Sequence numbers are drawn from one counter for all tickets, so they are
/// monotonic per ticket as well. A response is applied only if it is newer than
/// the last one applied to the same field group of that ticket and the ticket
/// has not been released since the request was issued.
#[derive(Debug, Default)]
pub struct Projection {
    entries: HashMap<String, Tracked>,
    next_seq: u64,
    next_generation: u64,
}

impl Projection {
    pub fn new() -> Self { Self::default() }

    pub fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Tag a request against a tracked ticket; `None` if it is not tracked.
    pub fn tag(&mut self, ticket_id: &str, group: FieldGroup) -> Option<RequestTag> {
        let generation = self.entries.get(ticket_id)?.generation;
        let seq = self.next_seq();
        Some(RequestTag { ticket_id: ticket_id.to_string(), group, generation, seq })
    }

    /// Merge the tag's field group from a confirmed server ticket. `updated_at`
    /// only ever moves forward.
    pub fn apply(&mut self, tag: &RequestTag, confirmed: &Ticket) -> Applied {
        let Some(entry) = self.entries.get_mut(&tag.ticket_id) else { return Applied::Released; };
        if entry.generation != tag.generation {
            return Applied::Released;
        }
        let slot = &mut entry.applied_seq[tag.group.index()];
        if tag.seq <= *slot {
            return Applied::Stale;
        }
        *slot = tag.seq;
        tag.group.copy(confirmed, &mut entry.ticket);
        entry.touch(confirmed);
        Applied::Applied
    }

    /// Insert a whole ticket from a fetch issued at `seq`, or refresh every field
    /// group of a tracked one that has not seen a newer response. `Stale` only
    /// when no group was refreshed.
    pub fn upsert(&mut self, seq: u64, ticket: Ticket) -> Applied {
        if let Some(entry) = self.entries.get_mut(&ticket.id) {
            let mut refreshed = false;
            for group in FieldGroup::ALL {
                let slot = &mut entry.applied_seq[group.index()];
                if seq > *slot {
                    *slot = seq;
                    group.copy(&ticket, &mut entry.ticket);
                    refreshed = true;
                }
            }
            if !refreshed {
                return Applied::Stale;
            }
            entry.touch(&ticket);
            return Applied::Applied;
        }
        self.next_generation += 1;
        let entry = Tracked { ticket, generation: self.next_generation, applied_seq: [seq; 4] };
        self.entries.insert(entry.ticket.id.clone(), entry);
        Applied::Applied
    }

    /// Drop a ticket after the server confirmed its deletion.
    pub fn remove(&mut self, tag: &RequestTag) -> Applied {
        match self.entries.get(&tag.ticket_id) {
            Some(e) if e.generation == tag.generation => {
                self.entries.remove(&tag.ticket_id);
                Applied::Applied
            }
            _ => Applied::Released,
        }
    }

    /// Stop tracking a ticket; completions still in flight for it are discarded.
    pub fn release(&mut self, ticket_id: &str) -> bool {
        self.entries.remove(ticket_id).is_some()
    }

    pub fn get(&self, ticket_id: &str) -> Option<Ticket> {
        self.entries.get(ticket_id).map(|e| e.ticket.clone())
    }

    /// Oldest first.
    pub fn tickets(&self) -> Vec<Ticket> {
        let mut out: Vec<Ticket> = self.entries.values().map(|e| e.ticket.clone()).collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod projection_tests;
