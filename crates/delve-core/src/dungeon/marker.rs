//! Connector state passes
//!
//! Runs after routing, in a fixed order:
//! 1. shared: touching connectors of different rooms merge into open floor
//! 2. used: both endpoints of every corridor
//! 3. hidden: a themed number of corridors become secret passages, picked
//!    only among used connectors that are not shared

use serde::{Deserialize, Serialize};

use super::corridor::CorridorId;
use super::layout::Layout;
use super::room::{ConnectorFlags, ConnectorId};
use super::theme::Theme;
use crate::rng::GameRng;

/// Counts produced by [`mark_connectors`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerReport {
    /// Connectors flagged `SHARED`
    pub shared: usize,
    /// Connectors flagged `USED`
    pub used: usize,
    /// Corridors whose endpoints were flagged `HIDDEN`
    pub hidden: Vec<CorridorId>,
}

fn flag(layout: &mut Layout, id: ConnectorId, flags: ConnectorFlags) {
    if let Some(connector) = layout.connector_mut(id) {
        connector.flags.insert(flags);
    }
}

fn has(layout: &Layout, id: ConnectorId, flags: ConnectorFlags) -> bool {
    layout.connector(id).is_some_and(|c| c.flags.contains(flags))
}

/// Pass 1: flag connectors of different rooms whose edges touch
fn mark_shared(layout: &mut Layout) -> usize {
    let edges: Vec<_> = layout
        .connector_ids()
        .filter_map(|id| layout.connector(id).map(|c| (id, c.edge)))
        .collect();

    let mut touching = Vec::new();
    for (i, (a, ea)) in edges.iter().enumerate() {
        for (b, eb) in &edges[i + 1..] {
            if a.room != b.room && ea.touches(eb) {
                touching.push(*a);
                touching.push(*b);
            }
        }
    }

    let mut count = 0;
    for id in touching {
        if !has(layout, id, ConnectorFlags::SHARED) {
            flag(layout, id, ConnectorFlags::SHARED);
            count += 1;
        }
    }
    count
}

/// Pass 2: flag both endpoints of every corridor
fn mark_used(layout: &mut Layout) -> usize {
    let endpoints: Vec<ConnectorId> =
        layout.corridors().flat_map(|(_, c)| [c.start, c.end]).collect();

    let mut count = 0;
    for id in endpoints {
        if !has(layout, id, ConnectorFlags::USED) {
            flag(layout, id, ConnectorFlags::USED);
            count += 1;
        }
    }
    count
}

/// Pass 3: hide the endpoints of a themed number of distinct corridors
fn mark_hidden(layout: &mut Layout, theme: &Theme, rng: &mut GameRng) -> Vec<CorridorId> {
    let wanted = theme.secret_corridors.sample(rng) as usize;
    let eligible = |id: ConnectorId| {
        has(layout, id, ConnectorFlags::USED) && !has(layout, id, ConnectorFlags::SHARED)
    };

    let mut candidates: Vec<CorridorId> = layout
        .corridors()
        .filter(|(_, c)| eligible(c.start) && eligible(c.end))
        .map(|(id, _)| id)
        .collect();
    rng.shuffle(&mut candidates);
    candidates.truncate(wanted);
    candidates.sort_unstable();

    for &id in &candidates {
        let (start, end) = (layout.corridor(id).start, layout.corridor(id).end);
        flag(layout, start, ConnectorFlags::HIDDEN);
        flag(layout, end, ConnectorFlags::HIDDEN);
    }
    if candidates.len() < wanted {
        tracing::debug!(wanted, hidden = candidates.len(), "fewer secret corridors than requested");
    }
    candidates
}

/// Run the shared, used and hidden passes in that order
pub fn mark_connectors(layout: &mut Layout, theme: &Theme, rng: &mut GameRng) -> MarkerReport {
    let shared = mark_shared(layout);
    let used = mark_used(layout);
    let hidden = mark_hidden(layout, theme, rng);

    tracing::info!(shared, used, hidden = hidden.len(), "connectors marked");
    MarkerReport { shared, used, hidden }
}
