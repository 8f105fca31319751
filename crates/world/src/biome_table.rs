//! Per-biome trait flags and pairwise relations consulted by the rules.
//!
//! The table has a fixed capacity of [`BIOME_COUNT`] ids. Ids outside
//! `0..BIOME_COUNT` are treated as absent: every trait and relation query is
//! false, and [`BiomeTable::mutation_for`] hands the id back unchanged.

use biomegen_core::LayerError;
use bitflags::bitflags;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Number of biome ids the relation table holds.
pub const BIOME_COUNT: usize = 256;

bitflags! {
    /// Trait flags of a single biome id.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BiomeFlags: u8 {
        /// The id names a registered biome.
        const VALID = 1 << 0;
        /// Jungles may border this biome without an edge.
        const JUNGLE_COMPATIBLE = 1 << 1;
        /// Ocean-like biome.
        const OCEANIC = 1 << 2;
        /// Belongs to the mesa family.
        const MESA = 1 << 3;
        /// Mutated variant of another biome.
        const MUTATION = 1 << 4;
        /// Belongs to the jungle family.
        const JUNGLE = 1 << 5;
        /// Snow-covered biome.
        const SNOWY = 1 << 6;
    }
}

bitflags! {
    /// Relation bits between an ordered pair of biome ids.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BiomeRelation: u8 {
        /// Same biome, same family, or both mesa plateaus.
        const EQUAL_OR_MESA_PLATEAU = 1 << 0;
        /// The two biomes may touch without an edge biome between them.
        const CAN_BE_NEIGHBORS = 1 << 1;
    }
}

#[inline(always)]
fn slot(id: i32) -> Option<usize> {
    usize::try_from(id).ok().filter(|&i| i < BIOME_COUNT)
}

/// Flags, mutations and pairwise relations for every biome id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiomeTable {
    flags: Vec<BiomeFlags>,
    mutations: Vec<i32>,
    relations: Vec<BiomeRelation>,
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl BiomeTable {
    /// A table in which no id is valid and nothing is related.
    pub fn empty() -> Self {
        Self {
            flags: vec![BiomeFlags::empty(); BIOME_COUNT],
            mutations: vec![-1; BIOME_COUNT],
            relations: vec![BiomeRelation::empty(); BIOME_COUNT * BIOME_COUNT],
        }
    }

    /// Build a table from the raw reload arrays.
    ///
    /// `equals` is indexed `b * count + a` for the relation of `(a, b)`.
    pub fn from_arrays(
        count: usize,
        flags: &[u8],
        mutations: &[i32],
        equals: &[u8],
    ) -> Result<Self, LayerError> {
        if count != BIOME_COUNT {
            return Err(LayerError::CapacityMismatch {
                expected: BIOME_COUNT,
                found: count,
            });
        }
        LayerError::check_len("flags", BIOME_COUNT, flags.len())?;
        LayerError::check_len("mutations", BIOME_COUNT, mutations.len())?;
        LayerError::check_len("equals", BIOME_COUNT * BIOME_COUNT, equals.len())?;

        Ok(Self {
            flags: flags[..BIOME_COUNT]
                .iter()
                .map(|&bits| BiomeFlags::from_bits_truncate(bits))
                .collect(),
            mutations: mutations[..BIOME_COUNT].to_vec(),
            relations: equals[..BIOME_COUNT * BIOME_COUNT]
                .iter()
                .map(|&bits| BiomeRelation::from_bits_truncate(bits))
                .collect(),
        })
    }

    /// Replace the whole table. On error the table is left unchanged.
    pub fn reload(
        &mut self,
        count: usize,
        flags: &[u8],
        mutations: &[i32],
        equals: &[u8],
    ) -> Result<(), LayerError> {
        *self = Self::from_arrays(count, flags, mutations, equals)?;
        Ok(())
    }

    /// Flags of `id`, empty for absent ids.
    #[inline]
    pub fn flags(&self, id: i32) -> BiomeFlags {
        slot(id).map_or(BiomeFlags::empty(), |i| self.flags[i])
    }

    /// Relation bits of the pair `(a, b)`, empty if either id is absent.
    #[inline]
    pub fn relation(&self, a: i32, b: i32) -> BiomeRelation {
        match (slot(a), slot(b)) {
            (Some(a), Some(b)) => self.relations[b * BIOME_COUNT + a],
            _ => BiomeRelation::empty(),
        }
    }

    #[inline]
    fn has(&self, id: i32, flag: BiomeFlags) -> bool {
        self.flags(id).contains(flag)
    }

    /// Whether `id` names a registered biome.
    #[inline]
    pub fn is_valid(&self, id: i32) -> bool {
        self.has(id, BiomeFlags::VALID)
    }

    /// Whether jungles may border `id` directly.
    #[inline]
    pub fn is_jungle_compatible(&self, id: i32) -> bool {
        self.has(id, BiomeFlags::JUNGLE_COMPATIBLE)
    }

    /// Whether `id` is ocean-like.
    #[inline]
    pub fn is_oceanic(&self, id: i32) -> bool {
        self.has(id, BiomeFlags::OCEANIC)
    }

    /// Whether `id` is in the mesa family.
    #[inline]
    pub fn is_mesa(&self, id: i32) -> bool {
        self.has(id, BiomeFlags::MESA)
    }

    /// Whether `id` is a mutated variant.
    #[inline]
    pub fn is_mutation(&self, id: i32) -> bool {
        self.has(id, BiomeFlags::MUTATION)
    }

    /// Whether `id` is in the jungle family.
    #[inline]
    pub fn is_jungle(&self, id: i32) -> bool {
        self.has(id, BiomeFlags::JUNGLE)
    }

    /// Whether `id` is snow-covered.
    #[inline]
    pub fn is_snowy(&self, id: i32) -> bool {
        self.has(id, BiomeFlags::SNOWY)
    }

    /// Equal, same family, or both mesa plateaus.
    #[inline]
    pub fn equal_or_mesa_plateau(&self, a: i32, b: i32) -> bool {
        self.relation(a, b)
            .contains(BiomeRelation::EQUAL_OR_MESA_PLATEAU)
    }

    /// Whether `a` and `b` may touch without an edge biome.
    #[inline]
    pub fn can_be_neighbors(&self, a: i32, b: i32) -> bool {
        self.relation(a, b).contains(BiomeRelation::CAN_BE_NEIGHBORS)
    }

    /// Mutated variant of `id`, `-1` if it has none, `id` itself if absent.
    #[inline]
    pub fn mutation_for(&self, id: i32) -> i32 {
        slot(id).map_or(id, |i| self.mutations[i])
    }
}

/// Shared relation table with copy-on-reload semantics.
///
/// Reloads build a complete table before swapping it in, so a reader holding a
/// [`snapshot`](Self::snapshot) never observes a half-written table.
#[derive(Debug)]
pub struct BiomeRegistry {
    current: RwLock<Arc<BiomeTable>>,
    version: AtomicU64,
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BiomeRegistry {
    /// Registry holding an empty table at version 0.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(BiomeTable::empty())),
            version: AtomicU64::new(0),
        }
    }

    /// Process-wide registry.
    pub fn global() -> &'static BiomeRegistry {
        static GLOBAL: OnceLock<BiomeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(BiomeRegistry::new)
    }

    /// Validate and install new reload arrays, returning the new version.
    pub fn reload(
        &self,
        count: usize,
        flags: &[u8],
        mutations: &[i32],
        equals: &[u8],
    ) -> Result<u64, LayerError> {
        match BiomeTable::from_arrays(count, flags, mutations, equals) {
            Ok(table) => Ok(self.install(table)),
            Err(err) => {
                warn!(error = %err, "rejected biome table reload");
                Err(err)
            }
        }
    }

    /// Swap in a fully built table, returning the new version.
    pub fn install(&self, table: BiomeTable) -> u64 {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(table);
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        info!(version, "biome table reloaded");
        version
    }

    /// The current table. Take one snapshot per evaluation.
    pub fn snapshot(&self) -> Arc<BiomeTable> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        debug!(version = self.version(), "biome table snapshot");
        Arc::clone(&current)
    }

    /// Number of successful reloads so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}
