use std::collections::HashMap;
use std::fmt;

use super::analysis::{AnalysisError, Globals};
use super::representation::Representation;

/// A non-owning reference to a [`Unit`] held in a [`UnitGraph`].
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitId(u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "#{}", self.0) }
}

// ----------------------------------------------------------------------------

/// One problem or topic under analysis.
///
/// A `Unit` carries alternative [`Representation`]s plus relational links to
/// other units. The links are populated by a [`UnitGraph`] and are inert
/// metadata: the well-posedness judgment reads only the representations.
///
/// Immutable value semantics: every update returns a new `Unit`.
#[derive(Debug, Clone, Default)]
pub struct Unit {
    representations: Vec<Representation>,
    parents: Vec<UnitId>,
    children: Vec<UnitId>,
}

impl Unit {
    /// A unit with an initial representation set and no links.
    pub fn new(representations: Vec<Representation>) -> Self {
        Self { representations, parents: Vec::new(), children: Vec::new() }
    }

    /// The representations, in insertion (display) order.
    pub fn representations(&self) -> &[Representation] { &self.representations }

    pub fn parents(&self) -> &[UnitId] { &self.parents }

    pub fn children(&self) -> &[UnitId] { &self.children }

    /// Replaces the representation set wholesale.
    pub fn with_representations(mut self, representations: Vec<Representation>) -> Self {
        self.representations = representations;
        self
    }

    /// Appends one representation.
    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representations.push(representation);
        self
    }

    fn with_parent(mut self, parent: UnitId) -> Self {
        if !self.parents.contains(&parent) { self.parents.push(parent); }
        self
    }

    fn with_child(mut self, child: UnitId) -> Self {
        if !self.children.contains(&child) { self.children.push(child); }
        self
    }

    /// Whether at least one representation is a self-contained closed
    /// description.
    ///
    /// An OR over the representation sequence, short-circuiting on the first
    /// success only: a representation that is merely not closed does not stop
    /// the search, and an empty sequence is `false`. An analysis error from
    /// an earlier representation surfaces unless one before it succeeded.
    pub fn is_well_posed(&self, globals: &impl Globals) -> Result<bool, AnalysisError> {
        for representation in &self.representations {
            if representation.is_closed(globals)? { return Ok(true); }
        }
        Ok(false)
    }
}

// ----------------------------------------------------------------------------

/// Owns [`Unit`] values, hands out [`UnitId`]s, and maintains both sides of
/// every parent/child link.
///
/// Units inside the graph are still immutable values; the graph swaps in
/// replacements rather than mutating in place.
#[derive(Debug, Default)]
pub struct UnitGraph {
    units: HashMap<UnitId, Unit>,
    next_id: u64,
}

impl UnitGraph {
    pub fn new() -> Self { Self::default() }

    /// Adds `unit` to the graph and returns its id.
    pub fn insert(&mut self, unit: Unit) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.units.insert(id, unit);
        id
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> { self.units.get(&id) }

    /// Records `child` under `parent`, updating the back link too.
    ///
    /// Unknown ids are ignored; the graph never invents units.
    pub fn link(&mut self, parent: UnitId, child: UnitId) {
        if !self.units.contains_key(&parent) || !self.units.contains_key(&child) {
            return;
        }
        if let Some(unit) = self.units.remove(&parent) {
            self.units.insert(parent, unit.with_child(child));
        }
        if let Some(unit) = self.units.remove(&child) {
            self.units.insert(child, unit.with_parent(parent));
        }
    }

    /// Replaces the unit at `id` with `unit`.
    pub fn replace(&mut self, id: UnitId, unit: Unit) {
        if self.units.contains_key(&id) { self.units.insert(id, unit); }
    }

    /// All ids, in insertion order.
    pub fn ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self.units.keys().copied().collect();
        ids.sort();
        ids
    }
}

// ----------------------------------------------------------------------------
