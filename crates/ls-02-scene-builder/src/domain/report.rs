//! Outcomes of construct and refresh runs.

use super::catalogue::ComponentRole;
use std::collections::BTreeMap;

/// A step that did not run or did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNote {
    pub step: &'static str,
    pub detail: String,
}

/// What a construct run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructReport {
    pub node_id: String,
    /// Resolved component id per role.
    pub components: BTreeMap<ComponentRole, String>,
    /// Steps skipped for a missing prerequisite.
    pub skipped: Vec<StepNote>,
    /// Steps the host rejected.
    pub failed: Vec<StepNote>,
}

impl ConstructReport {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            components: BTreeMap::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn component_id(&self, role: ComponentRole) -> Option<&str> {
        self.components.get(&role).map(String::as_str)
    }

    /// Every catalogue entry resolved and every step applied.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
            && self.failed.is_empty()
            && self.components.len() == ComponentRole::CATALOGUE.len()
    }

    pub(crate) fn skip(&mut self, step: &'static str, detail: impl Into<String>) {
        self.skipped.push(StepNote {
            step,
            detail: detail.into(),
        });
    }

    pub(crate) fn fail(&mut self, step: &'static str, detail: impl Into<String>) {
        self.failed.push(StepNote {
            step,
            detail: detail.into(),
        });
    }
}

/// Element of a remote collection that now holds the wanted target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSlot {
    pub element_id: String,
    /// The element was appended by this run rather than found.
    pub created: bool,
}

/// What a refresh-or-construct run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Existing node; only the texture URL changed.
    Updated { node_id: String, texture_id: String },
    /// Existing node without a texture component.
    NotUpdatable { node_id: String },
    /// No node existed; a new one was built.
    Constructed(ConstructReport),
}

impl RefreshOutcome {
    pub fn node_id(&self) -> &str {
        match self {
            RefreshOutcome::Updated { node_id, .. } | RefreshOutcome::NotUpdatable { node_id } => node_id,
            RefreshOutcome::Constructed(report) => &report.node_id,
        }
    }
}
