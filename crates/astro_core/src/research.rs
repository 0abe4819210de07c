use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::events::EventLog;
use crate::progression::Progression;
use crate::{Event, NodeId, ResearchNode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResearchError {
    #[error("research on '{0}' is already running")]
    AlreadyResearching(NodeId),
    #[error("unknown research node '{0}'")]
    UnknownNode(NodeId),
    #[error("'{0}' is already researched")]
    AlreadyUnlocked(NodeId),
    #[error("'{node_id}' needs '{missing}' first")]
    PrerequisiteMissing { node_id: NodeId, missing: NodeId },
}

/// Timed research over a prerequisite graph.
///
/// The engine knows nothing about the inventory or the crafting book: the
/// owner reads `ResearchNode::unlocks_recipes` after a completion and wires
/// the unlocks itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchEngine {
    nodes: Vec<ResearchNode>,
    process: Progression<NodeId>,
}

impl ResearchEngine {
    pub fn new(nodes: Vec<ResearchNode>) -> Self {
        Self {
            nodes,
            process: Progression::default(),
        }
    }

    pub fn nodes(&self) -> &[ResearchNode] {
        &self.nodes
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&ResearchNode> {
        self.nodes.iter().find(|n| &n.id == node_id)
    }

    pub fn is_researching(&self) -> bool {
        self.process.is_active()
    }

    pub fn current_node(&self) -> Option<&NodeId> {
        self.process.active_target()
    }

    pub fn progress(&self) -> f32 {
        self.process.progress()
    }

    /// Unknown ids count as locked, so a dangling prereq blocks its dependents.
    pub fn is_node_unlocked(&self, node_id: &NodeId) -> bool {
        self.node(node_id).is_some_and(|n| n.unlocked)
    }

    pub fn can_start(&self, node_id: &NodeId) -> bool {
        self.check_startable(node_id).is_ok()
    }

    fn check_startable(&self, node_id: &NodeId) -> Result<&ResearchNode, ResearchError> {
        let node = self
            .node(node_id)
            .ok_or_else(|| ResearchError::UnknownNode(node_id.clone()))?;
        if node.unlocked {
            return Err(ResearchError::AlreadyUnlocked(node_id.clone()));
        }
        if let Some(missing) = node.prereqs.iter().find(|p| !self.is_node_unlocked(p)) {
            return Err(ResearchError::PrerequisiteMissing {
                node_id: node_id.clone(),
                missing: missing.clone(),
            });
        }
        Ok(node)
    }

    /// Nodes that could be started right now, in graph order.
    pub fn available_nodes(&self) -> Vec<&ResearchNode> {
        self.nodes
            .iter()
            .filter(|n| !n.unlocked && self.can_start(&n.id))
            .collect()
    }

    pub fn start(&mut self, node_id: &NodeId, events: &mut EventLog) -> Result<(), ResearchError> {
        if let Some(current) = self.process.active_target() {
            return Err(ResearchError::AlreadyResearching(current.clone()));
        }
        let duration = self.check_startable(node_id)?.research_secs;
        self.process.begin(node_id.clone(), duration);
        events.emit(Event::ResearchStarted {
            node_id: node_id.clone(),
        });
        Ok(())
    }

    /// Advance the running research; returns the node if it finished this call.
    pub fn advance(&mut self, dt: f32, events: &mut EventLog) -> Option<NodeId> {
        let finished = self.process.advance(dt)?;
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == finished) {
            node.unlocked = true;
        }
        info!(node_id = %finished, "research completed");
        events.emit(Event::ResearchCompleted {
            node_id: finished.clone(),
        });
        Some(finished)
    }

    /// Abandon the running research and return its node. No-op while idle.
    pub fn cancel(&mut self, events: &mut EventLog) -> Option<NodeId> {
        let cancelled = self.process.cancel()?;
        events.emit(Event::ResearchCancelled {
            node_id: cancelled.clone(),
        });
        Some(cancelled)
    }
}
