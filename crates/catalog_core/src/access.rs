//! Capability gate consulted before catalog use cases run.
//!
//! Session validation and role resolution happen outside this crate; the
//! service only asks a [`CapabilityGate`] handed to it at construction time
//! whether an actor holds a capability.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Authenticated caller identity resolved by the outer layer.
pub type ActorId = i64;

/// Catalog capability checked by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CatalogCapability {
    /// Read categories and courses.
    ViewCategories,
    /// Create categories/courses and move categories.
    ManageCategories,
}

/// Capability string for read access.
pub const CAPABILITY_CATEGORY_VIEW: &str = "moodle/category:viewcourselist";
/// Capability string for write access.
pub const CAPABILITY_CATEGORY_MANAGE: &str = "moodle/category:manage";

impl CatalogCapability {
    /// Stable string id as stored in role-capability tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ViewCategories => CAPABILITY_CATEGORY_VIEW,
            Self::ManageCategories => CAPABILITY_CATEGORY_MANAGE,
        }
    }
}

impl Display for CatalogCapability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one capability from its stored string value.
pub fn parse_catalog_capability(value: &str) -> Result<CatalogCapability, CapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(CapabilityError::EmptyCapability);
    }

    match normalized {
        CAPABILITY_CATEGORY_VIEW => Ok(CatalogCapability::ViewCategories),
        CAPABILITY_CATEGORY_MANAGE => Ok(CatalogCapability::ManageCategories),
        other => Err(CapabilityError::UnsupportedCapability(other.to_string())),
    }
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    EmptyCapability,
    UnsupportedCapability(String),
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "capability value must not be empty"),
            Self::UnsupportedCapability(value) => write!(f, "capability is unsupported: {value}"),
        }
    }
}

impl Error for CapabilityError {}

/// Yes/no authorization decision.
pub trait CapabilityGate {
    fn is_granted(&self, actor: ActorId, capability: CatalogCapability) -> bool;
}

impl<G: CapabilityGate + ?Sized> CapabilityGate for Arc<G> {
    fn is_granted(&self, actor: ActorId, capability: CatalogCapability) -> bool {
        (**self).is_granted(actor, capability)
    }
}

impl<G: CapabilityGate + ?Sized> CapabilityGate for &G {
    fn is_granted(&self, actor: ActorId, capability: CatalogCapability) -> bool {
        (**self).is_granted(actor, capability)
    }
}

/// Gate granting everything; for trusted local tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CapabilityGate for AllowAll {
    fn is_granted(&self, _actor: ActorId, _capability: CatalogCapability) -> bool {
        true
    }
}

/// Explicit actor → capability table.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    grants: BTreeMap<ActorId, BTreeSet<CatalogCapability>>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants one capability; returns `self` for chained setup.
    pub fn grant(mut self, actor: ActorId, capability: CatalogCapability) -> Self {
        self.grants.entry(actor).or_default().insert(capability);
        self
    }

    /// Grants capabilities from stored string ids.
    pub fn grant_named<'a>(
        mut self,
        actor: ActorId,
        capabilities: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, CapabilityError> {
        for value in capabilities {
            let capability = parse_catalog_capability(value)?;
            self.grants.entry(actor).or_default().insert(capability);
        }
        Ok(self)
    }

    /// Returns the sorted capabilities of one actor.
    pub fn capabilities_of(&self, actor: ActorId) -> Vec<CatalogCapability> {
        self.grants
            .get(&actor)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl CapabilityGate for CapabilityTable {
    fn is_granted(&self, actor: ActorId, capability: CatalogCapability) -> bool {
        self.grants
            .get(&actor)
            .is_some_and(|set| set.contains(&capability))
    }
}
