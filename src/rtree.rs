use crate::config::{RTreeConfig, TreeVariant};
use crate::geometry::{Region, Shape};
use crate::node::{Entry, Node};
use crate::split::split_entries;
use crate::stats::Statistics;
use crate::storage::{ByteReader, NEW_PAGE, PageId, StorageManager};
use crate::{Error, Result};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Page the header record is stored under: the first page ever claimed.
const HEADER_PAGE: PageId = 0;

/// R-tree over a storage manager.
///
/// The tree owns the storage manager for its lifetime; nodes are read into
/// exclusively owned values, mutated in memory, and written back bottom-up.
/// [`RTree::flush`] persists the header and flushes storage — nothing is made
/// durable implicitly.
pub struct RTree<S: StorageManager> {
    pub(crate) storage: S,
    pub(crate) config: RTreeConfig,
    pub(crate) root_id: PageId,
    header_id: PageId,
    pub(crate) stats: Statistics,
}

/// Which levels already ran a forced reinsertion during one top-level
/// insert. Grows when a root split raises the tree mid-insert.
pub(crate) struct OverflowTable {
    levels: Vec<bool>,
}

impl OverflowTable {
    fn new(height: u32) -> Self {
        Self {
            levels: vec![false; height as usize],
        }
    }

    fn is_marked(&self, level: u32) -> bool {
        self.levels.get(level as usize).copied().unwrap_or(false)
    }

    fn mark(&mut self, level: u32) {
        let index = level as usize;
        if index >= self.levels.len() {
            self.levels.resize(index + 1, false);
        }
        self.levels[index] = true;
    }

    fn grow(&mut self, height: u32) {
        if self.levels.len() < height as usize {
            self.levels.resize(height as usize, false);
        }
    }
}

impl<S: StorageManager> RTree<S> {
    /// Build a fresh tree on `storage`: claims the header page, then writes
    /// an empty leaf root.
    pub fn create(storage: S, config: RTreeConfig) -> Result<Self> {
        config.validate()?;
        let mut tree = Self {
            storage,
            config,
            root_id: NEW_PAGE,
            header_id: NEW_PAGE,
            stats: Statistics::default(),
        };
        tree.store_header()?;

        tree.stats.tree_height = 1;
        tree.stats.nodes_in_level.push(0);
        let mut root = Node::new(0, config.leaf_capacity);
        tree.root_id = tree.write_node(&mut root)?;
        tree.store_header()?;
        Ok(tree)
    }

    /// Reattach to a tree previously flushed to `storage`.
    pub fn open(storage: S) -> Result<Self> {
        let mut tree = Self {
            storage,
            config: RTreeConfig::default(),
            root_id: NEW_PAGE,
            header_id: HEADER_PAGE,
            stats: Statistics::default(),
        };
        tree.load_header()?;
        Ok(tree)
    }

    pub fn config(&self) -> &RTreeConfig {
        &self.config
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn height(&self) -> u32 {
        self.stats.tree_height
    }

    pub fn root_id(&self) -> PageId {
        self.root_id
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Index `shape` under `id`, keeping `data` as the entry payload.
    pub fn insert(&mut self, data: &[u8], shape: &dyn Shape, id: i64) -> Result<()> {
        let mbr = shape.mbr();
        let mut path = Vec::new();
        let mut overflow = OverflowTable::new(self.stats.tree_height);
        let root = self.read_node(self.root_id)?;
        let target = self.choose_subtree(root, &mbr, 0, &mut path)?;
        self.insert_into_node(target, Entry::new(mbr, id, data.to_vec()), &mut path, &mut overflow)?;
        self.stats.data += 1;
        Ok(())
    }

    /// Remove the entry matching `(id, shape MBR)` exactly. Returns whether
    /// an entry was found.
    pub fn delete(&mut self, shape: &dyn Shape, id: i64) -> Result<bool> {
        let mbr = shape.mbr();
        let mut path = Vec::new();
        let root = self.read_node(self.root_id)?;
        let Some(leaf) = self.find_leaf(root, &mbr, id, &mut path)? else {
            return Ok(false);
        };
        self.delete_from_leaf(leaf, &mbr, id, path)?;
        self.stats.data -= 1;
        Ok(true)
    }

    /// Persist the header and flush storage. Until this runs, on-disk state
    /// reflects the last flush, not the in-memory tree.
    pub fn flush(&mut self) -> Result<()> {
        self.store_header()?;
        self.storage.flush()
    }

    /// Check the stored bookkeeping against the actual tree structure,
    /// logging every discrepancy. Returns whether everything agreed.
    pub fn validate(&mut self) -> Result<bool> {
        let root = self.read_node(self.root_id)?;
        if root.level != self.stats.tree_height - 1 {
            warn!(
                "stored tree height {} disagrees with root level {}",
                self.stats.tree_height, root.level
            );
            return Ok(false);
        }

        let mut ok = true;
        let mut found_in_level: BTreeMap<u32, u32> = BTreeMap::new();
        found_in_level.insert(root.level, 1);

        let mut stack = vec![(root.mbr, root)];
        while let Some((expected_mbr, node)) = stack.pop() {
            let mut union = Region::infinite();
            for entry in &node.entries {
                union.combine(&entry.mbr);
            }
            if union != node.mbr {
                warn!("node {} has a stale MBR", node.id);
                ok = false;
            } else if union != expected_mbr {
                warn!("parent entry for node {} has a stale MBR", node.id);
                ok = false;
            }

            if node.level != 0 {
                for entry in &node.entries {
                    let child = self.read_node(entry.id)?;
                    *found_in_level.entry(child.level).or_insert(0) += 1;
                    stack.push((entry.mbr, child));
                }
            }
        }

        let mut total = 0;
        for level in 0..self.stats.tree_height {
            let found = found_in_level.get(&level).copied().unwrap_or(0);
            if found != self.stats.nodes_in_level[level as usize] {
                warn!(
                    "level {level} holds {found} nodes but {} are recorded",
                    self.stats.nodes_in_level[level as usize]
                );
                ok = false;
            }
            total += found;
        }
        if total != self.stats.nodes {
            warn!("{total} nodes found but {} are recorded", self.stats.nodes);
            ok = false;
        }
        Ok(ok)
    }

    // ---- node I/O -------------------------------------------------------

    pub fn read_node(&mut self, id: PageId) -> Result<Node> {
        let buf = self.storage.load(id)?;
        let mut node = Node::decode(&buf)?;
        node.id = id;
        node.capacity = if node.level == 0 {
            self.config.leaf_capacity
        } else {
            self.config.index_capacity
        };
        self.stats.reads += 1;
        Ok(node)
    }

    pub(crate) fn write_node(&mut self, node: &mut Node) -> Result<PageId> {
        let buf = node.encode();
        let target = if node.id < 0 { NEW_PAGE } else { node.id };
        let assigned = self.storage.store(target, &buf)?;
        if node.id < 0 {
            node.id = assigned;
            self.stats.nodes += 1;
            let level = node.level as usize;
            let slot = self.stats.nodes_in_level.get_mut(level).ok_or_else(|| {
                Error::IllegalState(format!(
                    "node written at level {level} beyond the recorded tree height"
                ))
            })?;
            *slot += 1;
        }
        self.stats.writes += 1;
        Ok(assigned)
    }

    fn delete_node(&mut self, node: &Node) -> Result<()> {
        self.storage.delete(node.id)?;
        self.stats.nodes -= 1;
        let level = node.level as usize;
        let slot = self.stats.nodes_in_level.get_mut(level).ok_or_else(|| {
            Error::IllegalState(format!(
                "node deleted at level {level} beyond the recorded tree height"
            ))
        })?;
        *slot -= 1;
        Ok(())
    }

    // ---- header ---------------------------------------------------------

    fn store_header(&mut self) -> Result<()> {
        let mut buf = Vec::with_capacity(61 + self.stats.nodes_in_level.len() * 4);
        buf.extend_from_slice(&self.root_id.to_le_bytes());
        buf.extend_from_slice(&self.config.variant.to_tag().to_le_bytes());
        buf.extend_from_slice(&self.config.fill_factor.to_le_bytes());
        buf.extend_from_slice(&self.config.index_capacity.to_le_bytes());
        buf.extend_from_slice(&self.config.leaf_capacity.to_le_bytes());
        buf.extend_from_slice(&self.config.near_minimum_overlap_factor.to_le_bytes());
        buf.extend_from_slice(&self.config.split_distribution_factor.to_le_bytes());
        buf.extend_from_slice(&self.config.reinsert_factor.to_le_bytes());
        buf.push(u8::from(self.config.tight_mbrs));
        buf.extend_from_slice(&self.stats.nodes.to_le_bytes());
        buf.extend_from_slice(&self.stats.data.to_le_bytes());
        buf.extend_from_slice(&self.stats.tree_height.to_le_bytes());
        for count in &self.stats.nodes_in_level {
            buf.extend_from_slice(&count.to_le_bytes());
        }

        let target = if self.header_id < 0 {
            NEW_PAGE
        } else {
            self.header_id
        };
        self.header_id = self.storage.store(target, &buf)?;
        Ok(())
    }

    fn load_header(&mut self) -> Result<()> {
        let buf = self.storage.load(self.header_id)?;
        let mut reader = ByteReader::new(&buf, "tree header");

        self.root_id = reader.read_i64()?;
        self.config.variant = TreeVariant::from_tag(reader.read_u32()?)?;
        self.config.fill_factor = reader.read_f64()?;
        self.config.index_capacity = reader.read_u32()?;
        self.config.leaf_capacity = reader.read_u32()?;
        self.config.near_minimum_overlap_factor = reader.read_u32()?;
        self.config.split_distribution_factor = reader.read_f64()?;
        self.config.reinsert_factor = reader.read_f64()?;
        self.config.tight_mbrs = reader.read_u8()? != 0;
        self.stats.nodes = reader.read_u32()?;
        self.stats.data = reader.read_u64()?;
        self.stats.tree_height = reader.read_u32()?;
        self.stats.nodes_in_level.clear();
        for _ in 0..self.stats.tree_height {
            self.stats.nodes_in_level.push(reader.read_u32()?);
        }
        Ok(())
    }

    // ---- insertion ------------------------------------------------------

    /// Descend from `node` to `target_level`, recording the page ids of the
    /// nodes passed through.
    fn choose_subtree(
        &mut self,
        mut node: Node,
        mbr: &Region,
        target_level: u32,
        path: &mut Vec<PageId>,
    ) -> Result<Node> {
        while node.level != target_level {
            path.push(node.id);
            let child = match self.config.variant {
                TreeVariant::Linear | TreeVariant::Quadratic => {
                    find_least_enlargement(&node, mbr)
                }
                TreeVariant::RStar => {
                    if node.level == 1 {
                        // this node points to leaves
                        find_least_overlap(&node, mbr, self.config.near_minimum_overlap_factor)
                    } else {
                        find_least_enlargement(&node, mbr)
                    }
                }
            };
            node = self.read_node(node.entries[child].id)?;
        }
        Ok(node)
    }

    fn insert_at_level(
        &mut self,
        entry: Entry,
        level: u32,
        overflow: &mut OverflowTable,
    ) -> Result<()> {
        let mut path = Vec::new();
        let mbr = entry.mbr;
        let root = self.read_node(self.root_id)?;
        let target = self.choose_subtree(root, &mbr, level, &mut path)?;
        debug_assert_eq!(target.level, level);
        self.insert_into_node(target, entry, &mut path, overflow)?;
        Ok(())
    }

    /// Place `entry` in `node`, splitting or reinserting on overflow.
    /// Returns whether the path above was already adjusted.
    fn insert_into_node(
        &mut self,
        mut node: Node,
        entry: Entry,
        path: &mut Vec<PageId>,
        overflow: &mut OverflowTable,
    ) -> Result<bool> {
        if node.entries.len() < node.capacity as usize {
            let contained = node.mbr.contains_region(&entry.mbr);
            node.insert_entry(entry);
            self.write_node(&mut node)?;

            if !contained {
                if let Some(parent_id) = path.pop() {
                    let parent = self.read_node(parent_id)?;
                    self.adjust_tree(parent, node.id, node.mbr, path, false)?;
                    return Ok(true);
                }
            }
            Ok(false)
        } else if self.config.variant == TreeVariant::RStar
            && !path.is_empty()
            && !overflow.is_marked(node.level)
        {
            overflow.mark(node.level);
            let level = node.level;
            let evicted = self.prepare_reinsert(&mut node, entry);
            self.write_node(&mut node)?;
            debug!(
                "forced reinsertion of {} entries from node {} at level {level}",
                evicted.len(),
                node.id
            );

            // adjust the whole path first, then reinsert, so the reinserts
            // never race the pending MBR updates of their own path
            if let Some(parent_id) = path.pop() {
                let parent = self.read_node(parent_id)?;
                self.adjust_tree(parent, node.id, node.mbr, path, true)?;
            }
            for entry in evicted {
                self.insert_at_level(entry, level, overflow)?;
            }
            Ok(true)
        } else {
            let level = node.level;
            let at_root = path.is_empty();
            let (mut left, mut right) = self.split_node(node, entry)?;

            if at_root {
                left.id = NEW_PAGE;
                right.id = NEW_PAGE;
                self.write_node(&mut left)?;
                self.write_node(&mut right)?;

                let mut new_root = Node::new(level + 1, self.config.index_capacity);
                new_root.id = self.root_id;
                new_root.insert_entry(Entry::index(left.mbr, left.id));
                new_root.insert_entry(Entry::index(right.mbr, right.id));
                self.write_node(&mut new_root)?;

                self.stats.nodes_in_level[level as usize] = 2;
                self.stats.nodes_in_level.push(1);
                self.stats.tree_height = level + 2;
                overflow.grow(self.stats.tree_height);
                debug!("root split raised the tree to height {}", self.stats.tree_height);
            } else {
                self.write_node(&mut left)?;
                self.write_node(&mut right)?;
                if let Some(parent_id) = path.pop() {
                    let parent = self.read_node(parent_id)?;
                    self.adjust_tree_after_split(parent, &left, &right, path, overflow)?;
                }
            }
            Ok(true)
        }
    }

    /// Evict the entries whose centers sit farthest from the center of the
    /// combined MBR; the node keeps the rest. Returned entries are ordered
    /// closest-first for reinsertion.
    fn prepare_reinsert(&mut self, node: &mut Node, entry: Entry) -> Vec<Entry> {
        let mut combined = node.mbr;
        combined.combine(&entry.mbr);
        node.entries.push(entry);

        let total = node.entries.len();
        let count = ((self.config.reinsert_factor * total as f64).ceil() as usize)
            .min(total - 1)
            .max(1);
        let center = combined.center();

        let mut order: Vec<usize> = (0..total).collect();
        order.sort_by(|&a, &b| {
            let da = node.entries[a].mbr.center().min_distance_to_point(&center);
            let db = node.entries[b].mbr.center().min_distance_to_point(&center);
            da.total_cmp(&db)
        });

        let cut = total - count;
        let mut slots: Vec<Option<Entry>> = node.entries.drain(..).map(Some).collect();
        for &i in &order[..cut] {
            node.entries.push(slots[i].take().unwrap());
        }
        let mut evicted = Vec::with_capacity(count);
        for &i in &order[cut..] {
            evicted.push(slots[i].take().unwrap());
        }
        node.recompute_mbr();
        evicted
    }

    fn split_node(&mut self, mut node: Node, entry: Entry) -> Result<(Node, Node)> {
        self.stats.splits += 1;
        debug!("splitting node {} at level {}", node.id, node.level);

        node.entries.push(entry);
        let groups = split_entries(&node.entries, node.capacity, &self.config);

        let mut in_first = vec![false; node.entries.len()];
        for &i in &groups.group1 {
            in_first[i] = true;
        }

        let mut left = Node::new(node.level, node.capacity);
        let mut right = Node::new(node.level, node.capacity);
        left.id = node.id;
        for (i, entry) in node.entries.drain(..).enumerate() {
            if in_first[i] {
                left.insert_entry(entry);
            } else {
                right.insert_entry(entry);
            }
        }
        Ok((left, right))
    }

    /// Replace the parent entry for `child_id` with `child_mbr` and bubble
    /// the change upward while the parent MBR keeps moving.
    fn adjust_tree(
        &mut self,
        mut parent: Node,
        mut child_id: PageId,
        mut child_mbr: Region,
        path: &mut Vec<PageId>,
        force: bool,
    ) -> Result<()> {
        loop {
            self.stats.adjustments += 1;
            let index = child_index(&parent, child_id)?;

            let contained = parent.mbr.contains_region(&child_mbr);
            let touches = parent.mbr.touches_region(&parent.entries[index].mbr);
            let recompute = !contained || (touches && self.config.tight_mbrs);

            parent.entries[index].mbr = child_mbr;
            if recompute || force {
                parent.recompute_mbr();
            }
            self.write_node(&mut parent)?;

            if !(recompute || force) {
                break;
            }
            let Some(grandparent) = path.pop() else {
                break;
            };
            child_id = parent.id;
            child_mbr = parent.mbr;
            parent = self.read_node(grandparent)?;
        }
        Ok(())
    }

    /// Parent fix-up after `left`/`right` replaced one child: rewrite the
    /// left entry, insert the right half, and adjust upward unless the
    /// insertion already did.
    fn adjust_tree_after_split(
        &mut self,
        mut parent: Node,
        left: &Node,
        right: &Node,
        path: &mut Vec<PageId>,
        overflow: &mut OverflowTable,
    ) -> Result<()> {
        self.stats.adjustments += 1;
        let index = child_index(&parent, left.id)?;

        let contained =
            parent.mbr.contains_region(&left.mbr) && parent.mbr.contains_region(&right.mbr);
        let touches = parent.mbr.touches_region(&parent.entries[index].mbr);
        let recompute = !contained || (touches && self.config.tight_mbrs);

        parent.entries[index].mbr = left.mbr;
        if recompute {
            parent.recompute_mbr();
        }
        let parent_id = parent.id;
        let parent_mbr = parent.mbr;

        // insert_into_node writes the parent; no write needed here
        let adjusted = self.insert_into_node(
            parent,
            Entry::index(right.mbr, right.id),
            path,
            overflow,
        )?;

        if !adjusted && recompute {
            if let Some(grandparent) = path.pop() {
                let node = self.read_node(grandparent)?;
                self.adjust_tree(node, parent_id, parent_mbr, path, false)?;
            }
        }
        Ok(())
    }

    // ---- deletion -------------------------------------------------------

    /// Depth-first search for the leaf holding `(id, mbr)`, descending only
    /// into children whose MBR contains the target.
    fn find_leaf(
        &mut self,
        node: Node,
        mbr: &Region,
        id: i64,
        path: &mut Vec<PageId>,
    ) -> Result<Option<Node>> {
        if node.level == 0 {
            if node.entries.iter().any(|e| e.id == id && e.mbr == *mbr) {
                return Ok(Some(node));
            }
            return Ok(None);
        }

        path.push(node.id);
        for i in 0..node.entries.len() {
            if node.entries[i].mbr.contains_region(mbr) {
                let child = self.read_node(node.entries[i].id)?;
                if let Some(leaf) = self.find_leaf(child, mbr, id, path)? {
                    return Ok(Some(leaf));
                }
            }
        }
        path.pop();
        Ok(None)
    }

    fn delete_from_leaf(
        &mut self,
        mut leaf: Node,
        mbr: &Region,
        id: i64,
        mut path: Vec<PageId>,
    ) -> Result<()> {
        let index = leaf
            .entries
            .iter()
            .position(|e| e.id == id && e.mbr == *mbr)
            .ok_or_else(|| {
                Error::IllegalState(format!(
                    "leaf {} lost entry {id} between lookup and removal",
                    leaf.id
                ))
            })?;
        leaf.delete_entry(index, self.config.tight_mbrs);
        self.write_node(&mut leaf)?;

        let mut orphans = Vec::new();
        self.condense_tree(leaf, &mut orphans, &mut path)?;

        while let Some(orphan) = orphans.pop() {
            self.delete_node(&orphan)?;
            let level = orphan.level;
            for entry in orphan.entries {
                // sized per entry: reinsertions may change the height
                let mut overflow = OverflowTable::new(self.stats.tree_height);
                self.insert_at_level(entry, level, &mut overflow)?;
            }
        }
        Ok(())
    }

    /// Walk from a shrunken node back to the root, orphaning underfull nodes
    /// and tightening MBRs; collapses a single-child index root.
    fn condense_tree(
        &mut self,
        mut node: Node,
        orphans: &mut Vec<Node>,
        path: &mut Vec<PageId>,
    ) -> Result<()> {
        while let Some(parent_id) = path.pop() {
            let mut parent = self.read_node(parent_id)?;
            let index = child_index(&parent, node.id)?;

            let minimum_load = self.config.minimum_load(node.capacity) as usize;
            if node.entries.len() < minimum_load {
                parent.delete_entry(index, self.config.tight_mbrs);
                orphans.push(node);
            } else {
                parent.entries[index].mbr = node.mbr;
                // the MBR can only have shrunk, so tight mode recomputes
                if self.config.tight_mbrs {
                    parent.recompute_mbr();
                }
            }
            self.write_node(&mut parent)?;
            node = parent;
        }

        if node.level != 0 && node.entries.len() == 1 {
            debug!("collapsing root {} into its only child", node.id);
            let mut child = self.read_node(node.entries[0].id)?;
            self.delete_node(&child)?;
            child.id = self.root_id;
            self.write_node(&mut child)?;

            self.stats.nodes_in_level.pop();
            self.stats.tree_height -= 1;
            // the pending delete of the orphaned sibling decrements this again
            self.stats.nodes_in_level[self.stats.tree_height as usize - 1] = 2;
        } else if self.config.tight_mbrs {
            node.recompute_mbr();
            self.write_node(&mut node)?;
        } else {
            self.write_node(&mut node)?;
        }
        Ok(())
    }
}

fn child_index(parent: &Node, child_id: PageId) -> Result<usize> {
    parent
        .entries
        .iter()
        .position(|e| e.id == child_id)
        .ok_or_else(|| {
            Error::IllegalState(format!(
                "node {} holds no entry for child {child_id}",
                parent.id
            ))
        })
}

/// Guttman subtree choice: least area enlargement, ties by smaller area.
fn find_least_enlargement(node: &Node, r: &Region) -> usize {
    let mut least = f64::INFINITY;
    let mut best = 0;
    for (i, entry) in node.entries.iter().enumerate() {
        let mut combined = entry.mbr;
        combined.combine(r);
        let area = entry.mbr.area();
        let enlargement = combined.area() - area;

        if enlargement < least {
            least = enlargement;
            best = i;
        } else if enlargement == least
            && (enlargement == f64::INFINITY || area < node.entries[best].mbr.area())
        {
            best = i;
        }
    }
    best
}

/// R* subtree choice at leaf parents: among the entries of least
/// enlargement, the one whose growth overlaps the siblings least.
fn find_least_overlap(node: &Node, r: &Region, near_minimum_overlap_factor: u32) -> usize {
    struct Candidate {
        index: usize,
        enlargement: f64,
        original: Region,
        combined: Region,
        original_area: f64,
    }

    let mut candidates: Vec<Candidate> = Vec::with_capacity(node.entries.len());
    let mut best = 0;
    let mut least_enlargement = f64::MAX;

    for (i, entry) in node.entries.iter().enumerate() {
        let mut combined = entry.mbr;
        combined.combine(r);
        let original_area = entry.mbr.area();
        let candidate = Candidate {
            index: i,
            enlargement: combined.area() - original_area,
            original: entry.mbr,
            combined,
            original_area,
        };

        if candidate.enlargement < least_enlargement {
            least_enlargement = candidate.enlargement;
            best = i;
        } else if candidate.enlargement == least_enlargement
            && candidate.original_area < candidates[best].original_area
        {
            best = i;
        }
        candidates.push(candidate);
    }

    if least_enlargement < -f64::EPSILON || least_enlargement > f64::EPSILON {
        let inspect = if node.entries.len() > near_minimum_overlap_factor as usize {
            candidates.sort_by(|a, b| a.enlargement.total_cmp(&b.enlargement));
            near_minimum_overlap_factor as usize
        } else {
            candidates.len()
        };

        let mut least_overlap = f64::MAX;
        let mut chosen = 0;
        for (rank, candidate) in candidates.iter().take(inspect).enumerate() {
            let mut cost = 0.0;
            for (j, other) in node.entries.iter().enumerate() {
                if candidate.index != j {
                    let grown = candidate.combined.intersecting_area(&other.mbr);
                    if grown != 0.0 {
                        cost += grown - candidate.original.intersecting_area(&other.mbr);
                    }
                }
            }

            if cost < least_overlap {
                least_overlap = cost;
                chosen = rank;
            } else if cost == least_overlap {
                let current = &candidates[chosen];
                if candidate.enlargement == current.enlargement {
                    if candidate.original_area < current.original_area {
                        chosen = rank;
                    }
                } else if candidate.enlargement < current.enlargement {
                    chosen = rank;
                }
            }
        }
        best = candidates[chosen].index;
    }

    best
}
