//! NPC Registry — fixed-order personality catalog with round-robin assignment.
//!
//! NPCs are registered on a [`NpcRegistryBuilder`]; once built, the catalog
//! is frozen. The only moving part left is the assignment cursor, which is
//! atomic so a built registry can be shared behind an `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::error::{AetherError, Result};
use crate::types::{NpcId, NpcPersonality};

/// Collects NPC personalities before the catalog is frozen.
#[derive(Debug, Default)]
pub struct NpcRegistryBuilder {
    catalog: Vec<NpcPersonality>,
    index: HashMap<NpcId, usize>,
}

impl NpcRegistryBuilder {
    /// Add one NPC at the end of the catalog.
    ///
    /// # Errors
    /// Returns `AetherError::Configuration` if the id is already registered.
    pub fn register(&mut self, personality: NpcPersonality) -> Result<&mut Self> {
        if self.index.contains_key(&personality.id) {
            return Err(AetherError::Configuration(format!(
                "duplicate NPC id '{}'",
                personality.id
            )));
        }
        self.index.insert(personality.id.clone(), self.catalog.len());
        self.catalog.push(personality);
        Ok(self)
    }

    /// Freeze the catalog.
    ///
    /// # Errors
    /// Returns `AetherError::Configuration` if no NPC was registered.
    pub fn build(self) -> Result<NpcRegistry> {
        if self.catalog.is_empty() {
            return Err(AetherError::Configuration(
                "NPC roster is empty; register at least one NPC".into(),
            ));
        }
        debug!(npcs = self.catalog.len(), "NPC registry built");
        Ok(NpcRegistry {
            catalog: self.catalog,
            index: self.index,
            cursor: AtomicUsize::new(0),
        })
    }
}

/// Immutable NPC catalog plus the round-robin assignment cursor.
#[derive(Debug)]
pub struct NpcRegistry {
    catalog: Vec<NpcPersonality>,
    index: HashMap<NpcId, usize>,
    cursor: AtomicUsize,
}

impl NpcRegistry {
    /// Start registering NPCs.
    #[must_use]
    pub fn builder() -> NpcRegistryBuilder {
        NpcRegistryBuilder::default()
    }

    /// Build a registry from personalities in catalog order.
    ///
    /// # Errors
    /// Returns `AetherError::Configuration` on an empty roster or duplicate ids.
    pub fn from_personalities(
        personalities: impl IntoIterator<Item = NpcPersonality>,
    ) -> Result<Self> {
        let mut builder = Self::builder();
        for personality in personalities {
            builder.register(personality)?;
        }
        builder.build()
    }

    /// Next NPC in round-robin order. Each call advances the cursor by one.
    #[must_use]
    pub fn assign_next(&self) -> NpcId {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.catalog.len();
        self.catalog[slot].id.clone()
    }

    /// Look up a personality by id.
    ///
    /// # Errors
    /// Returns `AetherError::NotFound` if the id is not registered.
    pub fn get(&self, id: &NpcId) -> Result<&NpcPersonality> {
        self.index
            .get(id)
            .map(|&slot| &self.catalog[slot])
            .ok_or_else(|| AetherError::npc_not_found(id))
    }

    /// Number of registered NPCs. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Always `false`; a registry cannot be built empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Personalities in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &NpcPersonality> {
        self.catalog.iter()
    }
}

/// The stock village roster: guard, merchant, blacksmith.
#[must_use]
pub fn default_roster() -> Vec<NpcPersonality> {
    vec![
        NpcPersonality::new(
            "village_guard",
            "Marcus",
            "Village Guard",
            "A veteran soldier who protects the village",
        )
        .with_quirk("Always mentions his war stories")
        .with_quirk("Suspicious of strangers"),
        NpcPersonality::new(
            "merchant",
            "Elena",
            "Merchant",
            "A traveling trader with exotic goods",
        )
        .with_quirk("Always trying to make a sale")
        .with_quirk("Knows gossip from other towns"),
        NpcPersonality::new(
            "blacksmith",
            "Thorin",
            "Blacksmith",
            "Master craftsman who forges weapons and tools",
        )
        .with_quirk("Speaks in short sentences")
        .with_quirk("Proud of his work"),
    ]
}
