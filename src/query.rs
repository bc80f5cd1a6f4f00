use crate::geometry::{Point, Region, Shape};
use crate::node::Node;
use crate::rtree::RTree;
use crate::storage::{PageId, StorageManager};
use crate::Result;
use ordered_float::OrderedFloat;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Verdict a visitor returns for each node: `Continue` expands it, `Skip`
/// prunes its subtree, `Stop` ends the whole traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitorStatus {
    Stop,
    Skip,
    Continue,
}

/// Borrowed view of one indexed entry.
#[derive(Clone, Copy, Debug)]
pub struct DataEntry<'a> {
    pub id: i64,
    pub mbr: Region,
    pub data: &'a [u8],
}

pub trait Visitor {
    fn visit_node(&mut self, _node: &Node) -> VisitorStatus {
        VisitorStatus::Continue
    }

    fn visit_data(&mut self, _data: &DataEntry<'_>) {}

    /// Called with both sides of a self-join match.
    fn visit_pair(&mut self, _first: &DataEntry<'_>, _second: &DataEntry<'_>) {}
}

/// Distance oracle for nearest-neighbor traversal. The default implementation
/// ranks by MBR distance; callers with exact shapes refine `data_distance`.
pub trait NearestNeighborComparator {
    fn mbr_distance(&mut self, query: &dyn Shape, mbr: &Region) -> f64;
    fn data_distance(&mut self, query: &dyn Shape, data: &DataEntry<'_>) -> f64;
}

struct MbrDistance;

impl NearestNeighborComparator for MbrDistance {
    fn mbr_distance(&mut self, query: &dyn Shape, mbr: &Region) -> f64 {
        query.min_distance_to_region(mbr)
    }

    fn data_distance(&mut self, query: &dyn Shape, data: &DataEntry<'_>) -> f64 {
        query.min_distance_to_region(&data.mbr)
    }
}

/// Caller-driven traversal: the strategy inspects each fetched node and
/// names the next page to fetch, or `None` to stop.
pub trait QueryStrategy {
    fn next_entry(&mut self, node: &Node) -> Option<PageId>;
}

/// Visitor that remembers the ids of every entry it is shown.
#[derive(Debug, Default)]
pub struct IdCollector {
    ids: Vec<i64>,
}

impl IdCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<i64> {
        self.ids
    }
}

impl Visitor for IdCollector {
    fn visit_data(&mut self, data: &DataEntry<'_>) {
        self.ids.push(data.id);
    }
}

/// Visitor that clones out every entry, payload included.
#[derive(Debug, Default)]
pub struct EntryCollector {
    entries: Vec<(i64, Region, Vec<u8>)>,
}

impl EntryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(i64, Region, Vec<u8>)] {
        &self.entries
    }
}

impl Visitor for EntryCollector {
    fn visit_data(&mut self, data: &DataEntry<'_>) {
        self.entries.push((data.id, data.mbr, data.data.to_vec()));
    }
}

enum RangePredicate {
    Containment,
    Intersection,
}

enum NnCandidate {
    Node(PageId),
    Data { id: i64, mbr: Region, data: Vec<u8> },
}

struct NnEntry {
    dist: OrderedFloat<f64>,
    candidate: NnCandidate,
}

impl PartialEq for NnEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}

impl Eq for NnEntry {}

impl PartialOrd for NnEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NnEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.cmp(&other.dist)
    }
}

impl<S: StorageManager> RTree<S> {
    /// Emit every entry whose MBR intersects the query shape.
    pub fn intersects_with_query(
        &mut self,
        query: &dyn Shape,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        self.range_query(RangePredicate::Intersection, query, visitor)
    }

    /// Emit every entry whose MBR covers `point`.
    pub fn point_location_query(
        &mut self,
        point: &Point,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        let query = Region::from_points(point, point);
        self.range_query(RangePredicate::Intersection, &query, visitor)
    }

    /// Emit every entry whose MBR lies fully inside the query shape; a
    /// subtree fully covered by the query is emitted without further tests.
    pub fn contains_what_query(
        &mut self,
        query: &dyn Shape,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        let root = self.read_node(self.root_id)?;
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if node.level == 0 {
                match visitor.visit_node(&node) {
                    VisitorStatus::Stop => return Ok(()),
                    VisitorStatus::Skip => continue,
                    VisitorStatus::Continue => {}
                }
                for entry in &node.entries {
                    if query.contains_region(&entry.mbr) {
                        visitor.visit_data(&DataEntry {
                            id: entry.id,
                            mbr: entry.mbr,
                            data: &entry.data,
                        });
                        self.stats.query_results += 1;
                    }
                }
            } else if query.contains_region(&node.mbr) {
                self.visit_subtree(node, visitor)?;
            } else if query.intersects_region(&node.mbr) {
                match visitor.visit_node(&node) {
                    VisitorStatus::Stop => return Ok(()),
                    VisitorStatus::Skip => continue,
                    VisitorStatus::Continue => {}
                }
                for entry in &node.entries {
                    if query.intersects_region(&entry.mbr) {
                        stack.push(self.read_node(entry.id)?);
                    }
                }
            }
        }
        Ok(())
    }

    /// Emit internal nodes fully covered by the query. A covered node is
    /// reported once, with every descendant leaf id packed little-endian
    /// into its payload; covered leaf entries are reported with their id as
    /// payload.
    pub fn internal_nodes_query(
        &mut self,
        query: &dyn Shape,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        let root = self.read_node(self.root_id)?;
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if query.contains_region(&node.mbr) {
                let node_id = node.id;
                let node_mbr = node.mbr;
                let mut ids = IdCollector::new();
                self.visit_subtree(node, &mut ids)?;

                let mut payload = Vec::with_capacity(ids.ids().len() * 8);
                for id in ids.ids() {
                    payload.extend_from_slice(&id.to_le_bytes());
                }
                visitor.visit_data(&DataEntry {
                    id: node_id,
                    mbr: node_mbr,
                    data: &payload,
                });
                self.stats.query_results += 1;
            } else if node.level == 0 {
                for entry in &node.entries {
                    if query.contains_region(&entry.mbr) {
                        visitor.visit_data(&DataEntry {
                            id: node.id,
                            mbr: entry.mbr,
                            data: &entry.id.to_le_bytes(),
                        });
                        self.stats.query_results += 1;
                    }
                }
            } else if query.intersects_region(&node.mbr) {
                for entry in &node.entries {
                    stack.push(self.read_node(entry.id)?);
                }
            }
        }
        Ok(())
    }

    /// Report the `k` nearest entries by MBR distance, closest first. Every
    /// entry tying with the k-th distance is reported too.
    pub fn nearest_neighbor_query(
        &mut self,
        k: u32,
        query: &dyn Shape,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        self.nearest_neighbor_query_with(k, query, visitor, &mut MbrDistance)
    }

    /// Nearest-neighbor traversal ranked by a caller-supplied comparator.
    pub fn nearest_neighbor_query_with(
        &mut self,
        k: u32,
        query: &dyn Shape,
        visitor: &mut dyn Visitor,
        comparator: &mut dyn NearestNeighborComparator,
    ) -> Result<()> {
        let mut queue: BinaryHeap<Reverse<NnEntry>> = BinaryHeap::new();
        queue.push(Reverse(NnEntry {
            dist: OrderedFloat(0.0),
            candidate: NnCandidate::Node(self.root_id),
        }));

        let mut count = 0u32;
        let mut k_nearest = 0.0f64;

        loop {
            match queue.peek() {
                None => break,
                Some(Reverse(head)) if count >= k && head.dist.into_inner() > k_nearest => break,
                Some(_) => {}
            }
            let Some(Reverse(head)) = queue.pop() else {
                break;
            };

            match head.candidate {
                NnCandidate::Node(page) => {
                    let node = self.read_node(page)?;
                    match visitor.visit_node(&node) {
                        VisitorStatus::Stop => return Ok(()),
                        VisitorStatus::Skip => continue,
                        VisitorStatus::Continue => {}
                    }
                    if node.level == 0 {
                        for entry in node.entries {
                            let dist = comparator.data_distance(
                                query,
                                &DataEntry {
                                    id: entry.id,
                                    mbr: entry.mbr,
                                    data: &entry.data,
                                },
                            );
                            queue.push(Reverse(NnEntry {
                                dist: OrderedFloat(dist),
                                candidate: NnCandidate::Data {
                                    id: entry.id,
                                    mbr: entry.mbr,
                                    data: entry.data,
                                },
                            }));
                        }
                    } else {
                        for entry in &node.entries {
                            let dist = comparator.mbr_distance(query, &entry.mbr);
                            queue.push(Reverse(NnEntry {
                                dist: OrderedFloat(dist),
                                candidate: NnCandidate::Node(entry.id),
                            }));
                        }
                    }
                }
                NnCandidate::Data { id, mbr, data } => {
                    visitor.visit_data(&DataEntry {
                        id,
                        mbr,
                        data: &data,
                    });
                    self.stats.query_results += 1;
                    count += 1;
                    k_nearest = head.dist.into_inner();
                }
            }
        }
        Ok(())
    }

    /// Report every pair of distinct entries inside the query region whose
    /// MBRs intersect. Each unordered pair is reported exactly once.
    pub fn self_join_query(&mut self, query: &dyn Shape, visitor: &mut dyn Visitor) -> Result<()> {
        let region = query.mbr();
        self.self_join(self.root_id, self.root_id, region, visitor)
    }

    fn self_join(
        &mut self,
        first: PageId,
        second: PageId,
        region: Region,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        let n1 = self.read_node(first)?;
        let same = first == second;
        let n2 = if same { n1.clone() } else { self.read_node(second)? };

        match visitor.visit_node(&n1) {
            VisitorStatus::Stop | VisitorStatus::Skip => return Ok(()),
            VisitorStatus::Continue => {}
        }
        if !same {
            match visitor.visit_node(&n2) {
                VisitorStatus::Stop | VisitorStatus::Skip => return Ok(()),
                VisitorStatus::Continue => {}
            }
        }

        if n1.level == 0 {
            for (i, e1) in n1.entries.iter().enumerate() {
                if !region.intersects_region(&e1.mbr) {
                    continue;
                }
                // on the diagonal, only look forward so each pair shows once
                let start = if same { i + 1 } else { 0 };
                for e2 in &n2.entries[start.min(n2.entries.len())..] {
                    if e1.id != e2.id
                        && region.intersects_region(&e2.mbr)
                        && e1.mbr.intersects_region(&e2.mbr)
                    {
                        visitor.visit_pair(
                            &DataEntry {
                                id: e1.id,
                                mbr: e1.mbr,
                                data: &e1.data,
                            },
                            &DataEntry {
                                id: e2.id,
                                mbr: e2.mbr,
                                data: &e2.data,
                            },
                        );
                    }
                }
            }
        } else {
            for i in 0..n1.entries.len() {
                let m1 = n1.entries[i].mbr;
                if !region.intersects_region(&m1) {
                    continue;
                }
                let start = if same { i } else { 0 };
                for j in start..n2.entries.len() {
                    let m2 = n2.entries[j].mbr;
                    if region.intersects_region(&m2) && m1.intersects_region(&m2) {
                        let refined = region.intersecting_region(&m1.intersecting_region(&m2));
                        self.self_join(n1.entries[i].id, n2.entries[j].id, refined, visitor)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Hand every fetched node to the strategy until it stops asking.
    pub fn query_strategy(&mut self, strategy: &mut dyn QueryStrategy) -> Result<()> {
        let mut next = self.root_id;
        loop {
            let node = self.read_node(next)?;
            match strategy.next_entry(&node) {
                Some(page) => next = page,
                None => return Ok(()),
            }
        }
    }

    /// Visit the internal structure without emitting data.
    pub fn level_traversal(&mut self, visitor: &mut dyn Visitor) -> Result<()> {
        let root = self.read_node(self.root_id)?;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match visitor.visit_node(&node) {
                VisitorStatus::Stop => return Ok(()),
                VisitorStatus::Skip => continue,
                VisitorStatus::Continue => {}
            }
            if node.is_index() {
                for entry in &node.entries {
                    stack.push(self.read_node(entry.id)?);
                }
            }
        }
        Ok(())
    }

    fn range_query(
        &mut self,
        predicate: RangePredicate,
        query: &dyn Shape,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        let root = self.read_node(self.root_id)?;
        let mut stack = Vec::new();
        if !root.entries.is_empty() && query.intersects_region(&root.mbr) {
            stack.push(root);
        }

        while let Some(node) = stack.pop() {
            match visitor.visit_node(&node) {
                VisitorStatus::Stop => return Ok(()),
                VisitorStatus::Skip => continue,
                VisitorStatus::Continue => {}
            }
            if node.level == 0 {
                for entry in &node.entries {
                    let matches = match predicate {
                        RangePredicate::Containment => query.contains_region(&entry.mbr),
                        RangePredicate::Intersection => query.intersects_region(&entry.mbr),
                    };
                    if matches {
                        visitor.visit_data(&DataEntry {
                            id: entry.id,
                            mbr: entry.mbr,
                            data: &entry.data,
                        });
                        self.stats.query_results += 1;
                    }
                }
            } else {
                for entry in &node.entries {
                    if query.intersects_region(&entry.mbr) {
                        stack.push(self.read_node(entry.id)?);
                    }
                }
            }
        }
        Ok(())
    }

    fn visit_subtree(&mut self, subtree: Node, visitor: &mut dyn Visitor) -> Result<()> {
        let mut stack = vec![subtree];
        while let Some(node) = stack.pop() {
            match visitor.visit_node(&node) {
                VisitorStatus::Stop => return Ok(()),
                VisitorStatus::Skip => continue,
                VisitorStatus::Continue => {}
            }
            if node.level == 0 {
                for entry in &node.entries {
                    visitor.visit_data(&DataEntry {
                        id: entry.id,
                        mbr: entry.mbr,
                        data: &entry.data,
                    });
                    self.stats.query_results += 1;
                }
            } else {
                for entry in &node.entries {
                    stack.push(self.read_node(entry.id)?);
                }
            }
        }
        Ok(())
    }
}
