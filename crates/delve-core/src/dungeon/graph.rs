//! Room graph over rooms and corridors
//!
//! Nodes live in an arena and link to each other by index, so cycles in the
//! corridor network need no special ownership handling.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::corridor::{Corridor, CorridorId};
use super::layout::Layout;
use super::room::{Room, RoomId};
use super::theme::Theme;
use crate::error::{GenError, Result};

/// Index of a node in its `RoomGraph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// One room in the graph and its corridor links
#[derive(Debug, Clone)]
pub struct Node {
    pub room: RoomId,
    /// Links in insertion order
    links: Vec<(CorridorId, NodeId)>,
    centrality: u32,
}

impl Node {
    pub fn links(&self) -> &[(CorridorId, NodeId)] {
        &self.links
    }

    pub fn centrality(&self) -> u32 {
        self.centrality
    }
}

/// One step of a traversal
///
/// The root is yielded first with no parent and no corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub parent: Option<NodeId>,
    pub corridor: Option<CorridorId>,
    pub node: NodeId,
}

/// Item offered to a `set_theme` predicate
#[derive(Debug, Clone, Copy)]
pub enum ThemedItem<'a> {
    Room(&'a Room),
    Corridor(&'a Corridor),
}

#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    nodes: Vec<Node>,
    by_room: HashMap<RoomId, NodeId>,
}

impl RoomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// One node per corridor endpoint room, then one link per corridor
    pub fn build(layout: &Layout) -> Result<Self> {
        let mut graph = Self::new();
        for (_, corridor) in layout.corridors() {
            let (a, b) = corridor.rooms();
            graph.node_for_room(a);
            graph.node_for_room(b);
        }
        for (id, _) in layout.corridors() {
            graph.link_corridor(layout, id)?;
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            corridors = layout.corridor_count(),
            "room graph built"
        );
        Ok(graph)
    }

    /// Node for `room`, created on first request
    pub fn node_for_room(&mut self, room: RoomId) -> NodeId {
        if let Some(&id) = self.by_room.get(&room) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            room,
            links: Vec::new(),
            centrality: 0,
        });
        self.by_room.insert(room, id);
        id
    }

    pub fn node_of(&self, room: RoomId) -> Option<NodeId> {
        self.by_room.get(&room).copied()
    }

    /// Link the two endpoint rooms of a corridor in both directions
    ///
    /// Linking the same corridor twice is a no-op and self-loops are ignored.
    /// Both rooms must already have nodes.
    pub fn link_corridor(&mut self, layout: &Layout, corridor: CorridorId) -> Result<()> {
        let (ra, rb) = layout.corridor(corridor).rooms();
        let lookup = |room: RoomId| {
            self.node_of(room).ok_or_else(|| {
                GenError::Invariant(format!(
                    "corridor {} ends in room {} with no node",
                    corridor.0, room.0
                ))
            })
        };
        let (a, b) = (lookup(ra)?, lookup(rb)?);
        if a == b {
            return Ok(());
        }
        if self.nodes[a.0].links.iter().any(|&(c, _)| c == corridor) {
            return Ok(());
        }

        self.nodes[a.0].links.push((corridor, b));
        self.nodes[b.0].links.push((corridor, a));
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first walk from `root`
    ///
    /// Every reachable corridor is yielded exactly once. A room is expanded
    /// only the first time it is reached; later corridors into it are still
    /// yielded but not followed.
    pub fn traverse(&self, root: NodeId) -> Traversal<'_> {
        Traversal {
            graph: self,
            root: Some(root),
            stack: Vec::new(),
            seen_nodes: HashSet::new(),
            seen_corridors: HashSet::new(),
        }
    }

    /// Score every node relative to `root`
    ///
    /// The root scores 0. Any other node explores depth-first from itself,
    /// never entering the root or revisiting a node or corridor, and adds
    /// `1 + score` for each neighbour it reaches. Recomputing from the same
    /// root gives the same scores.
    pub fn compute_centrality(&mut self, root: NodeId) {
        let scores: Vec<u32> = (0..self.nodes.len())
            .map(|i| {
                let node = NodeId(i);
                if node == root {
                    return 0;
                }
                let mut seen_nodes = HashSet::from([root, node]);
                let mut seen_corridors = HashSet::new();
                self.explore(node, &mut seen_nodes, &mut seen_corridors)
            })
            .collect();

        for (node, score) in self.nodes.iter_mut().zip(scores) {
            node.centrality = score;
        }
    }

    fn explore(
        &self,
        from: NodeId,
        seen_nodes: &mut HashSet<NodeId>,
        seen_corridors: &mut HashSet<CorridorId>,
    ) -> u32 {
        let mut total = 0;
        for &(corridor, next) in &self.nodes[from.0].links {
            if seen_corridors.contains(&corridor) || seen_nodes.contains(&next) {
                continue;
            }
            seen_corridors.insert(corridor);
            seen_nodes.insert(next);
            total += 1 + self.explore(next, seen_nodes, seen_corridors);
        }
        total
    }

    /// First node of maximum centrality
    pub fn most_central(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for (id, node) in self.nodes() {
            if best.is_none_or(|(_, score)| node.centrality > score) {
                best = Some((id, node.centrality));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Apply `theme` to every room and corridor reached from `root` that
    /// `predicate` accepts
    pub fn set_theme<P>(&self, layout: &mut Layout, root: NodeId, theme: &Arc<Theme>, predicate: P)
    where
        P: Fn(ThemedItem<'_>) -> bool,
    {
        for step in self.traverse(root) {
            let room = self.node(step.node).room;
            if predicate(ThemedItem::Room(layout.room(room))) {
                layout.room_mut(room).theme = Some(Arc::clone(theme));
            }
            if let Some(corridor) = step.corridor
                && predicate(ThemedItem::Corridor(layout.corridor(corridor)))
            {
                layout.corridor_mut(corridor).theme = Some(Arc::clone(theme));
            }
        }
    }
}

/// Iterator returned by [`RoomGraph::traverse`]
pub struct Traversal<'a> {
    graph: &'a RoomGraph,
    root: Option<NodeId>,
    /// (node, index of the next link to try)
    stack: Vec<(NodeId, usize)>,
    seen_nodes: HashSet<NodeId>,
    seen_corridors: HashSet<CorridorId>,
}

impl Iterator for Traversal<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if let Some(root) = self.root.take() {
            if root.0 >= self.graph.nodes.len() {
                return None;
            }
            self.seen_nodes.insert(root);
            self.stack.push((root, 0));
            return Some(Step {
                parent: None,
                corridor: None,
                node: root,
            });
        }

        while let Some(top) = self.stack.last_mut() {
            let (node, next) = *top;
            let Some(&(corridor, child)) = self.graph.nodes[node.0].links.get(next) else {
                self.stack.pop();
                continue;
            };
            top.1 += 1;

            if !self.seen_corridors.insert(corridor) {
                continue;
            }
            if self.seen_nodes.insert(child) {
                self.stack.push((child, 0));
            }
            return Some(Step {
                parent: Some(node),
                corridor: Some(corridor),
                node: child,
            });
        }
        None
    }
}
