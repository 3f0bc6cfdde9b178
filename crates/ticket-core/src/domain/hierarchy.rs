//! Ticket Hierarchy
//!
//! Parent/child helpers over a flat list of tickets.

use std::collections::{HashMap, HashSet};

use super::ticket::{Ticket, TicketId};

/// Direct children of a ticket, ordered by start
pub fn children(tickets: &[Ticket], parent_id: TicketId) -> Vec<Ticket> {
    let mut result: Vec<Ticket> = tickets
        .iter()
        .filter(|t| t.parent_id == Some(parent_id))
        .cloned()
        .collect();
    result.sort_by_key(|t| (t.start, t.id));
    result
}

/// Render tickets as an indented tree using recursive DFS.
/// Returns (Ticket, depth) pairs in display order; siblings sort by start.
/// Tickets whose parent is not in the list are treated as roots.
pub fn flatten_hierarchy(tickets: &[Ticket]) -> Vec<(Ticket, usize)> {
    let known: HashSet<TicketId> = tickets.iter().map(|t| t.id).collect();

    // Build parent -> children map
    let mut children_map: HashMap<Option<TicketId>, Vec<&Ticket>> = HashMap::new();
    for ticket in tickets {
        let parent = ticket.parent_id.filter(|p| known.contains(p) && *p != ticket.id);
        children_map.entry(parent).or_default().push(ticket);
    }
    for siblings in children_map.values_mut() {
        siblings.sort_by_key(|t| (t.start, t.id));
    }

    fn collect(
        parent_id: Option<TicketId>,
        depth: usize,
        children_map: &HashMap<Option<TicketId>, Vec<&Ticket>>,
        visited: &mut HashSet<TicketId>,
        result: &mut Vec<(Ticket, usize)>,
    ) {
        let Some(siblings) = children_map.get(&parent_id) else { return };
        for ticket in siblings {
            // A corrupt parent chain must not recurse forever
            if !visited.insert(ticket.id) {
                continue;
            }
            result.push(((*ticket).clone(), depth));
            collect(Some(ticket.id), depth + 1, children_map, visited, result);
        }
    }

    let mut result = Vec::new();
    let mut visited = HashSet::new();
    collect(None, 0, &children_map, &mut visited, &mut result);
    result
}

/// Ancestor IDs from the direct parent up to the root
pub fn ancestors(tickets: &[Ticket], id: TicketId) -> Vec<TicketId> {
    let parents: HashMap<TicketId, Option<TicketId>> =
        tickets.iter().map(|t| (t.id, t.parent_id)).collect();

    let mut chain = Vec::new();
    let mut current = parents.get(&id).copied().flatten();
    while let Some(pid) = current {
        if pid == id || chain.contains(&pid) {
            break;
        }
        chain.push(pid);
        current = parents.get(&pid).copied().flatten();
    }
    chain
}

/// Whether re-parenting `id` under `new_parent` would form a cycle
pub fn would_create_cycle(tickets: &[Ticket], id: TicketId, new_parent: Option<TicketId>) -> bool {
    match new_parent {
        None => false,
        Some(pid) if pid == id => true,
        Some(pid) => ancestors(tickets, pid).contains(&id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_ticket(id: TicketId, parent_id: Option<TicketId>, hour: u32) -> Ticket {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap();
        let mut t = Ticket::new(id, 1, format!("Ticket {}", id), start, start + chrono::Duration::hours(1)).unwrap();
        t.parent_id = parent_id;
        t
    }

    #[test]
    fn test_flatten_hierarchy() {
        let tickets = vec![
            make_ticket(1, None, 8),
            make_ticket(2, None, 12),
            make_ticket(3, Some(1), 10),
            make_ticket(4, Some(1), 9),
            make_ticket(5, Some(3), 10),
        ];

        let tree = flatten_hierarchy(&tickets);
        let order: Vec<(TicketId, usize)> = tree.iter().map(|(t, d)| (t.id, *d)).collect();
        assert_eq!(order, vec![(1, 0), (4, 1), (3, 1), (5, 2), (2, 0)]);
    }

    #[test]
    fn test_orphans_become_roots() {
        let tickets = vec![make_ticket(1, Some(99), 8), make_ticket(2, Some(1), 9)];
        let tree = flatten_hierarchy(&tickets);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].1, 0);
        assert_eq!(tree[1].1, 1);
    }

    #[test]
    fn test_children_sorted_by_start() {
        let tickets = vec![make_ticket(1, None, 8), make_ticket(2, Some(1), 11), make_ticket(3, Some(1), 9)];
        let ids: Vec<TicketId> = children(&tickets, 1).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_ancestors_and_cycles() {
        let tickets = vec![make_ticket(1, None, 8), make_ticket(2, Some(1), 9), make_ticket(3, Some(2), 10)];
        assert_eq!(ancestors(&tickets, 3), vec![2, 1]);
        assert!(would_create_cycle(&tickets, 1, Some(3)));
        assert!(would_create_cycle(&tickets, 2, Some(2)));
        assert!(!would_create_cycle(&tickets, 3, Some(1)));
        assert!(!would_create_cycle(&tickets, 3, None));
    }
}
