//! Criteria-query relationship source
//!
//! The lookup, tie-break and not-found mechanics are fixed here; concrete
//! sources only contribute search criteria through [`CriteriaSource`].

use async_trait::async_trait;
use tracing::debug;

use artifactgraph_storage::{
    ArtifactModel, ArtifactType, Criteria, RecordSummary, RelationshipContext, RelationshipUpdate, Target,
};

use crate::errors::Result;

/// Record slot a resolved target is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipSlot {
    pub owner: String,
    pub relationship: String,
}

impl RelationshipSlot {
    pub fn new(owner: impl Into<String>, relationship: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            relationship: relationship.into(),
        }
    }
}

/// Outcome of one deferred lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Target found; the update writes it into the slot
    Resolved(RelationshipUpdate),
    /// Nothing matched; the optional update removes a pending placeholder
    NotFound(Option<RelationshipUpdate>),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn into_update(self) -> Option<RelationshipUpdate> {
        match self {
            Resolution::Resolved(update) => Some(update),
            Resolution::NotFound(cleanup) => cleanup,
        }
    }
}

/// A relationship resolved after persistence
#[async_trait]
pub trait RelationshipSource: Send + Sync {
    /// Resolve against already persisted records
    ///
    /// A missing target is a [`Resolution::NotFound`], never an error; only a
    /// failing lookup is.
    async fn build(&mut self, context: &dyn RelationshipContext) -> Result<Resolution>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Supplies the search criteria for a [`CriteriaQueryRelationshipSource`]
pub trait CriteriaSource: Send + Sync {
    fn add_criteria(&self, criteria: &mut Criteria);

    /// Called when no candidate of `kind` matched
    fn not_found(&self, _kind: ArtifactType, _criteria: &Criteria) {}

    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owning {
    /// Single-valued slot holding a pending placeholder
    Target,
    /// Multi-valued slot; nothing is inserted until resolution succeeds
    Collection,
}

/// Criteria lookup over one or more candidate kinds, newest match wins
pub struct CriteriaQueryRelationshipSource<C> {
    criteria_source: C,
    slot: RelationshipSlot,
    owning: Owning,
    target: Option<Target>,
    target_type: ArtifactType,
    scope: ArtifactModel,
    candidates: Vec<ArtifactType>,
}

impl<C: CriteriaSource> CriteriaQueryRelationshipSource<C> {
    /// Resolve into a single-valued slot that already holds `placeholder`
    pub fn for_target(
        criteria_source: C,
        slot: RelationshipSlot,
        placeholder: Target,
        scope: ArtifactModel,
        candidates: Vec<ArtifactType>,
    ) -> Self {
        Self {
            criteria_source,
            slot,
            owning: Owning::Target,
            target_type: placeholder.artifact_type,
            target: Some(placeholder),
            scope,
            candidates,
        }
    }

    /// Resolve into a multi-valued slot (e.g. `importedXsds`)
    pub fn for_collection(
        criteria_source: C,
        slot: RelationshipSlot,
        target_type: ArtifactType,
        scope: ArtifactModel,
        candidates: Vec<ArtifactType>,
    ) -> Self {
        Self {
            criteria_source,
            slot,
            owning: Owning::Collection,
            target: None,
            target_type,
            scope,
            candidates,
        }
    }

    /// Current target: the placeholder before `build`, the resolved target
    /// after a successful `build`, `None` after a miss.
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn slot(&self) -> &RelationshipSlot {
        &self.slot
    }

    pub fn criteria(&self) -> Criteria {
        let mut criteria = Criteria::new();
        self.criteria_source.add_criteria(&mut criteria);
        criteria
    }
}

/// Most recently created summary; equal timestamps fall back to the smaller uuid
fn newest(matches: Vec<RecordSummary>) -> Option<RecordSummary> {
    matches.into_iter().max_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| b.uuid.cmp(&a.uuid))
    })
}

#[async_trait]
impl<C: CriteriaSource> RelationshipSource for CriteriaQueryRelationshipSource<C> {
    async fn build(&mut self, context: &dyn RelationshipContext) -> Result<Resolution> {
        let criteria = self.criteria();

        // No criteria would match every record of the candidate kinds
        let mut matches = Vec::new();
        if criteria.is_empty() {
            debug!(source = %self.criteria_source.describe(), "empty criteria, lookup skipped");
        } else {
            for kind in &self.candidates {
                matches.extend(context.find_records(self.scope, *kind, &criteria).await?);
            }
        }
        let candidate_count = matches.len();

        match newest(matches) {
            Some(found) => {
                debug!(
                    source = %self.criteria_source.describe(),
                    candidates = candidate_count,
                    target = %found.uuid,
                    "resolved deferred relationship"
                );
                let resolved = Target::to(found.uuid, found.artifact_type);
                self.target = Some(resolved.clone());
                let update = match self.owning {
                    Owning::Target => RelationshipUpdate::set(&self.slot.owner, &self.slot.relationship, resolved),
                    Owning::Collection => {
                        RelationshipUpdate::append(&self.slot.owner, &self.slot.relationship, resolved)
                    }
                };
                Ok(Resolution::Resolved(update))
            }
            None => {
                self.criteria_source.not_found(self.target_type, &criteria);
                self.target = None;
                let cleanup = match self.owning {
                    Owning::Target => Some(RelationshipUpdate::clear(&self.slot.owner, &self.slot.relationship)),
                    Owning::Collection => None,
                };
                Ok(Resolution::NotFound(cleanup))
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} -> {}.{}",
            self.criteria_source.describe(),
            self.slot.owner,
            self.slot.relationship
        )
    }
}

impl<C> std::fmt::Debug for CriteriaQueryRelationshipSource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriteriaQueryRelationshipSource")
            .field("slot", &self.slot)
            .field("target_type", &self.target_type)
            .field("scope", &self.scope)
            .field("candidates", &self.candidates)
            .finish()
    }
}
