//! Triplet knowledge base
//!
//! Deduplicates triplets by `(head, type, tail)` while preserving insertion
//! order. When built with an [`EntityResolver`], triplet endpoints are
//! canonicalized before deduplication and colliding triplets have their
//! provenance merged; without one, a duplicate is discarded as-is.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use relkg_core::{Entity, EntityResolver, Triplet};

/// What happened to a triplet passed to [`KnowledgeBase::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stored as a new triplet
    Inserted,
    /// Matched an existing triplet; new provenance spans were merged into it
    Merged { spans_added: usize },
    /// Matched an existing triplet and was discarded
    Duplicate,
    /// An endpoint could not be resolved; nothing was recorded
    Dropped,
}

/// Deduplicating store of triplets for one extraction request
#[derive(Clone, Default)]
pub struct KnowledgeBase {
    triplets: Vec<Triplet>,
    entities: BTreeMap<String, Entity>,
    resolver: Option<Arc<dyn EntityResolver>>,
}

impl KnowledgeBase {
    /// Create a plain knowledge base without canonicalization
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a knowledge base that canonicalizes endpoints through `resolver`
    pub fn with_resolver(resolver: Arc<dyn EntityResolver>) -> Self {
        Self {
            resolver: Some(resolver),
            ..Self::default()
        }
    }

    pub fn is_canonicalizing(&self) -> bool {
        self.resolver.is_some()
    }

    /// Add a triplet, canonicalizing it first when a resolver is configured
    pub async fn add(&mut self, triplet: Triplet) -> AddOutcome {
        match self.resolver.clone() {
            Some(resolver) => self.add_canonical(resolver.as_ref(), triplet).await,
            None => self.insert(triplet),
        }
    }

    /// Add a triplet without canonicalization
    ///
    /// A duplicate is discarded together with its provenance.
    pub fn insert(&mut self, triplet: Triplet) -> AddOutcome {
        if self.position(&triplet).is_some() {
            return AddOutcome::Duplicate;
        }
        self.triplets.push(triplet);
        AddOutcome::Inserted
    }

    async fn add_canonical(
        &mut self,
        resolver: &dyn EntityResolver,
        mut triplet: Triplet,
    ) -> AddOutcome {
        let (head, tail) = futures::join!(
            resolver.resolve(&triplet.head),
            resolver.resolve(&triplet.tail)
        );

        let (Some(head), Some(tail)) = (head.into_entity(), tail.into_entity()) else {
            tracing::debug!(
                head = %triplet.head,
                tail = %triplet.tail,
                resolver = resolver.name(),
                "Dropping triplet with unresolved entity"
            );
            return AddOutcome::Dropped;
        };

        triplet.head = head.title.clone();
        triplet.tail = tail.title.clone();
        self.register_entity(head);
        self.register_entity(tail);

        match self.position(&triplet) {
            Some(index) => {
                let spans_added = self.triplets[index].provenance.merge(&triplet.provenance);
                AddOutcome::Merged { spans_added }
            }
            None => {
                self.triplets.push(triplet);
                AddOutcome::Inserted
            }
        }
    }

    /// Register an entity unless its title is already known.
    /// Returns true if it was added.
    pub fn register_entity(&mut self, entity: Entity) -> bool {
        if self.entities.contains_key(&entity.title) {
            return false;
        }
        self.entities.insert(entity.title.clone(), entity);
        true
    }

    fn position(&self, triplet: &Triplet) -> Option<usize> {
        self.triplets.iter().position(|t| t.same_relation(triplet))
    }

    /// Stored triplets in insertion order
    pub fn triplets(&self) -> &[Triplet] {
        &self.triplets
    }

    /// Canonical entities keyed by title
    pub fn entities(&self) -> &BTreeMap<String, Entity> {
        &self.entities
    }

    /// Unique heads and tails in first-seen order
    pub fn entity_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.triplets
            .iter()
            .flat_map(|t| [t.head.as_str(), t.tail.as_str()])
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.triplets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triplets.is_empty()
    }

    pub fn into_triplets(self) -> Vec<Triplet> {
        self.triplets
    }
}

impl fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("triplets", &self.triplets)
            .field("entities", &self.entities)
            .field("resolver", &self.resolver.as_ref().map(|r| r.name()))
            .finish()
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entities:")?;
        for entity in self.entities.values() {
            writeln!(f, "  {} <{}>", entity.title, entity.url)?;
        }
        writeln!(f, "Relations:")?;
        for triplet in &self.triplets {
            let spans: Vec<String> = triplet.provenance.iter().map(|s| s.to_string()).collect();
            writeln!(f, "  {triplet} {}", spans.join(" "))?;
        }
        Ok(())
    }
}
