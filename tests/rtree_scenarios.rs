//! End-to-end scenarios over small hand-checked datasets: insert and range
//! query, split shape, condense back to a leaf root, nearest neighbors,
//! self-join pairing, and internal-node reporting.

use rectdb::config::{RTreeConfig, TreeVariant};
use rectdb::disk::DiskStorageManager;
use rectdb::geometry::{Point, Region};
use rectdb::node::Node;
use rectdb::query::{DataEntry, IdCollector, Visitor};
use rectdb::rtree::RTree;
use rectdb::storage::MemoryStorageManager;
use tempfile::tempdir;

fn unit_square(x: f64, y: f64) -> Region {
    Region::new([x, y], [x + 1.0, y + 1.0])
}

fn capacity_four() -> RTreeConfig {
    RTreeConfig {
        variant: TreeVariant::RStar,
        index_capacity: 4,
        leaf_capacity: 4,
        ..RTreeConfig::default()
    }
}

fn corner_tree() -> RTree<MemoryStorageManager> {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    for (id, (x, y)) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0), (5.0, 5.0)]
        .into_iter()
        .enumerate()
    {
        tree.insert(&[], &unit_square(x, y), id as i64).unwrap();
    }
    tree
}

fn union_of_entries(node: &Node) -> Region {
    let mut mbr = Region::infinite();
    for entry in node.entries() {
        mbr.combine(&entry.mbr);
    }
    mbr
}

#[test]
fn diagonal_squares_intersection_query() {
    let dir = tempdir().unwrap();
    let storage = DiskStorageManager::create(dir.path().join("tree"), 4096, 4096).unwrap();
    let mut tree = RTree::create(storage, RTreeConfig::default()).unwrap();

    for i in 0..10 {
        let lo = i as f64;
        tree.insert(&[], &Region::new([lo, lo], [lo + 1.0, lo + 1.0]), i)
            .unwrap();
    }

    let mut hits = IdCollector::new();
    tree.intersects_with_query(&Region::new([2.5, 2.5], [4.5, 4.5]), &mut hits)
        .unwrap();
    let mut ids = hits.into_ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3, 4]);
}

#[test]
fn fifth_insert_splits_the_root() {
    let mut tree = corner_tree();

    assert_eq!(tree.height(), 2);
    let root = tree.read_node(tree.root_id()).unwrap();
    assert!(root.is_index());
    assert_eq!(root.entries().len(), 2);

    for entry in root.entries().to_vec() {
        let leaf = tree.read_node(entry.id).unwrap();
        assert!(leaf.is_leaf());
        assert!(leaf.entries().len() >= 2);
        assert_eq!(*leaf.mbr(), union_of_entries(&leaf));
        assert_eq!(entry.mbr, *leaf.mbr());
    }
    assert!(tree.validate().unwrap());
}

#[test]
fn deleting_down_to_one_entry_collapses_the_tree() {
    let mut tree = corner_tree();

    for (id, (x, y)) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]
        .into_iter()
        .enumerate()
    {
        assert!(tree.delete(&unit_square(x, y), id as i64).unwrap());
    }

    assert_eq!(tree.height(), 1);
    let root = tree.read_node(tree.root_id()).unwrap();
    assert_eq!(root.level(), 0);
    assert_eq!(root.entries().len(), 1);
    assert_eq!(root.entries()[0].id, 4);
    assert_eq!(tree.statistics().data, 1);
    assert!(tree.validate().unwrap());
}

#[test]
fn nearest_neighbors_come_back_closest_first() {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    for i in 0..4 {
        tree.insert(&[], &Point::new([i as f64, 0.0]), i).unwrap();
    }

    let mut hits = IdCollector::new();
    tree.nearest_neighbor_query(2, &Point::new([0.4, 0.0]), &mut hits)
        .unwrap();
    assert_eq!(hits.ids(), &[0, 1]);
}

#[test]
fn nearest_neighbors_include_ties_beyond_k() {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    // two entries tie at distance 1 from the query point
    tree.insert(&[], &Point::new([1.0, 0.0]), 1).unwrap();
    tree.insert(&[], &Point::new([-1.0, 0.0]), 2).unwrap();
    tree.insert(&[], &Point::new([5.0, 0.0]), 3).unwrap();

    let mut hits = IdCollector::new();
    tree.nearest_neighbor_query(1, &Point::new([0.0, 0.0]), &mut hits)
        .unwrap();
    let mut ids = hits.into_ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
}

#[derive(Default)]
struct PairCollector {
    pairs: Vec<(i64, i64)>,
}

impl Visitor for PairCollector {
    fn visit_pair(&mut self, first: &DataEntry<'_>, second: &DataEntry<'_>) {
        let pair = if first.id <= second.id {
            (first.id, second.id)
        } else {
            (second.id, first.id)
        };
        self.pairs.push(pair);
    }
}

#[test]
fn self_join_reports_each_unordered_pair_once() {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    tree.insert(&[], &Region::new([0.0, 0.0], [2.0, 2.0]), 1).unwrap();
    tree.insert(&[], &Region::new([1.0, 1.0], [3.0, 3.0]), 2).unwrap();
    tree.insert(&[], &Region::new([1.5, 0.5], [2.5, 2.5]), 3).unwrap();

    let mut pairs = PairCollector::default();
    tree.self_join_query(&Region::new([0.0, 0.0], [4.0, 4.0]), &mut pairs)
        .unwrap();

    pairs.pairs.sort_unstable();
    assert_eq!(pairs.pairs, vec![(1, 2), (1, 3), (2, 3)]);
}

#[test]
fn self_join_respects_the_query_region() {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    // overlapping pair inside the window, overlapping pair far outside
    tree.insert(&[], &Region::new([0.0, 0.0], [2.0, 2.0]), 1).unwrap();
    tree.insert(&[], &Region::new([1.0, 1.0], [3.0, 3.0]), 2).unwrap();
    tree.insert(&[], &Region::new([50.0, 50.0], [52.0, 52.0]), 3).unwrap();
    tree.insert(&[], &Region::new([51.0, 51.0], [53.0, 53.0]), 4).unwrap();

    let mut pairs = PairCollector::default();
    tree.self_join_query(&Region::new([0.0, 0.0], [10.0, 10.0]), &mut pairs)
        .unwrap();
    assert_eq!(pairs.pairs, vec![(1, 2)]);
}

#[test]
fn internal_nodes_query_packs_descendant_ids() {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    for i in 0..12 {
        tree.insert(&[], &unit_square(i as f64 * 2.0, 0.0), i).unwrap();
    }
    assert!(tree.height() > 1);

    #[derive(Default)]
    struct PayloadCollector {
        payloads: Vec<Vec<u8>>,
    }
    impl Visitor for PayloadCollector {
        fn visit_data(&mut self, data: &DataEntry<'_>) {
            self.payloads.push(data.data.to_vec());
        }
    }

    // a window covering everything reports the root once, with every leaf
    // id packed into the payload
    let mut hits = PayloadCollector::default();
    tree.internal_nodes_query(&Region::new([-1.0, -1.0], [30.0, 2.0]), &mut hits)
        .unwrap();
    assert_eq!(hits.payloads.len(), 1);

    let payload = &hits.payloads[0];
    assert_eq!(payload.len(), 12 * 8);
    let mut ids: Vec<i64> = payload
        .chunks_exact(8)
        .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap()))
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..12).collect::<Vec<_>>());
}
