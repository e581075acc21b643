//! Texture-to-unit assignment for batched draw calls.
//!
//! Given the textures referenced by buffered primitives in order, the
//! assigner partitions them into contiguous groups of at most
//! `max_texture_units` distinct textures, and assigns each texture a unit
//! slot. Textures that were bound by the previous draw call keep their slot,
//! so a sprite sheet that dominates a scene is bound once and stays put.
//!
//! The generation tick lives on the assigner instance and the per-texture
//! tags live in a side table keyed by texture uid; neither leaks into the
//! texture's public type or any process-wide state.

use ahash::AHashMap;

use crate::draw_call::TextureBatchGroup;
use crate::texture::TextureHandle;

const NO_SLOT: u32 = u32::MAX;

/// Transient batching metadata for one texture, valid for one grouping pass.
struct TextureTag {
    /// Tick of the pass that last counted this texture into a group.
    generation: u64,
    /// Unit slot assigned when that group was closed.
    slot: u32,
}

/// Splits buffered textures into unit-bounded groups with stable slots.
pub struct TextureUnitAssigner {
    /// Monotonic pass counter. Instance-local: passes are serialized per
    /// renderer, so no global tick is needed.
    tick: u64,
    tags: AHashMap<u64, TextureTag>,
    /// Textures bound by the most recently closed group, carried across
    /// flushes to seed slot assignments.
    bound: Vec<Option<TextureHandle>>,
    /// Tick that last claimed each slot; a slot is free for reassignment
    /// when its claim is stale.
    slot_claims: Vec<u64>,
}

impl TextureUnitAssigner {
    pub fn new() -> Self {
        Self {
            tick: 0,
            tags: AHashMap::new(),
            bound: Vec::new(),
            slot_claims: Vec::new(),
        }
    }

    /// Forget all carried bindings and tags, e.g. after a context restore.
    pub fn reset(&mut self) {
        self.tags.clear();
        self.bound.clear();
        self.slot_claims.clear();
    }

    /// Partition `textures` (one entry per buffered primitive, in order)
    /// into groups of at most `max_units` distinct textures.
    ///
    /// `groups` is a reusable pool grown on demand; the return value is the
    /// number of entries used this pass. `splits` receives the exclusive
    /// element end of each group, and `element_units` the resolved unit slot
    /// for every input element. Units are recorded as each group closes, so
    /// a texture revisited by a later group cannot clobber the slot an
    /// earlier element packs with.
    pub fn build_groups(
        &mut self,
        textures: &[TextureHandle],
        max_units: usize,
        groups: &mut Vec<TextureBatchGroup>,
        splits: &mut Vec<usize>,
        element_units: &mut Vec<u32>,
    ) -> usize {
        assert!(max_units >= 1, "at least one texture unit required");

        splits.clear();
        element_units.clear();
        element_units.resize(textures.len(), 0);
        if textures.is_empty() {
            return 0;
        }

        if self.bound.len() != max_units {
            self.bound.clear();
            self.bound.resize(max_units, None);
            self.slot_claims.clear();
            self.slot_claims.resize(max_units, 0);
        }

        let mut used = 0usize;
        let mut start = 0usize;
        self.tick += 1;
        ensure_group(groups, used);

        for (i, tex) in textures.iter().enumerate() {
            let generation = self.tags.get(&tex.uid()).map_or(0, |t| t.generation);
            if generation == self.tick {
                continue;
            }

            if groups[used].count() == max_units {
                self.close_group(
                    &mut groups[used],
                    &textures[start..i],
                    &mut element_units[start..i],
                );
                splits.push(i);
                start = i;
                used += 1;
                self.tick += 1;
                ensure_group(groups, used);
            }

            self.tags
                .entry(tex.uid())
                .and_modify(|t| t.generation = self.tick)
                .or_insert(TextureTag {
                    generation: self.tick,
                    slot: NO_SLOT,
                });
            groups[used].push(tex.clone());
        }

        self.close_group(
            &mut groups[used],
            &textures[start..],
            &mut element_units[start..],
        );
        splits.push(textures.len());
        used + 1
    }

    /// Finalize unit slots for a full group and resolve its elements' units.
    ///
    /// A texture already sitting in the carried bound array keeps its slot;
    /// anything else takes the first slot neither claimed in the current
    /// tick nor held by another group member waiting to keep it. Group
    /// membership is visible through the generation tag, which the walk
    /// stamps before closing, so a carried texture's slot is protected even
    /// when a new texture precedes it in group order.
    fn close_group(
        &mut self,
        group: &mut TextureBatchGroup,
        element_textures: &[TextureHandle],
        element_units: &mut [u32],
    ) {
        let tick = self.tick;
        let max_units = self.bound.len();
        let mut next_free = 0usize;

        for idx in 0..group.count() {
            let tex = group.textures()[idx].clone();
            let prev_slot = self.tags.get(&tex.uid()).map_or(NO_SLOT, |t| t.slot);

            let keep = (prev_slot as usize) < max_units
                && self.slot_claims[prev_slot as usize] != tick
                && self.bound[prev_slot as usize].as_ref() == Some(&tex);

            let slot = if keep {
                prev_slot
            } else {
                loop {
                    let claimed = self.slot_claims[next_free] == tick;
                    let reserved = self.bound[next_free].as_ref().is_some_and(|held| {
                        self.tags.get(&held.uid()).is_some_and(|tag| {
                            tag.generation == tick && tag.slot == next_free as u32
                        })
                    });
                    if !claimed && !reserved {
                        break;
                    }
                    next_free += 1;
                    assert!(
                        next_free < max_units,
                        "texture group exceeded unit capacity"
                    );
                }
                self.bound[next_free] = Some(tex.clone());
                next_free as u32
            };

            self.slot_claims[slot as usize] = tick;
            if let Some(tag) = self.tags.get_mut(&tex.uid()) {
                tag.slot = slot;
            }
            group.set_unit(idx, slot);
        }

        for (e, tex) in element_textures.iter().enumerate() {
            element_units[e] = self
                .tags
                .get(&tex.uid())
                .map_or(NO_SLOT, |t| t.slot);
        }
    }
}

impl Default for TextureUnitAssigner {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_group(groups: &mut Vec<TextureBatchGroup>, index: usize) {
    if groups.len() <= index {
        groups.push(TextureBatchGroup::new());
    }
    groups[index].clear();
}
