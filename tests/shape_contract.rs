//! The geometry contract as the index consumes it: shapes other than plain
//! regions on both sides of the API — as indexed entries (reduced to their
//! bounds) and as query shapes (driving the traversal predicates).

use rectdb::config::RTreeConfig;
use rectdb::geometry::{Edge, Face, Point, Region, Shape};
use rectdb::query::{DataEntry, IdCollector, NearestNeighborComparator};
use rectdb::rtree::RTree;
use rectdb::storage::MemoryStorageManager;

fn capacity_four() -> RTreeConfig {
    RTreeConfig {
        index_capacity: 4,
        leaf_capacity: 4,
        ..RTreeConfig::default()
    }
}

fn grid_tree() -> RTree<MemoryStorageManager> {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    for id in 0..16i64 {
        let x = (id % 4) as f64 * 3.0;
        let y = (id / 4) as f64 * 3.0;
        tree.insert(&[], &Region::new([x, y], [x + 1.0, y + 1.0]), id)
            .unwrap();
    }
    tree
}

#[test]
fn edge_query_hits_only_crossed_squares() {
    let mut tree = grid_tree();

    // horizontal segment through the second row, y = 3.5
    let edge = Edge::new(Point::new([-1.0, 3.5]), Point::new([11.0, 3.5]));
    let mut hits = IdCollector::new();
    tree.intersects_with_query(&edge, &mut hits).unwrap();
    let mut ids = hits.into_ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![4, 5, 6, 7]);

    // diagonal through the grid corner squares
    let diagonal = Edge::new(Point::new([0.0, 0.0]), Point::new([10.0, 10.0]));
    let mut hits = IdCollector::new();
    tree.intersects_with_query(&diagonal, &mut hits).unwrap();
    let mut ids = hits.into_ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 5, 10, 15]);

    // a segment between rows touches nothing
    let gap = Edge::new(Point::new([-1.0, 2.0]), Point::new([11.0, 2.0]));
    let mut hits = IdCollector::new();
    tree.intersects_with_query(&gap, &mut hits).unwrap();
    assert!(hits.ids().is_empty());
}

#[test]
fn edges_index_under_their_bounds() {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    let spokes = [
        Edge::new(Point::new([0.0, 0.0]), Point::new([4.0, 4.0])),
        Edge::new(Point::new([10.0, 0.0]), Point::new([14.0, 4.0])),
        Edge::new(Point::new([0.0, 10.0]), Point::new([4.0, 14.0])),
    ];
    for (id, edge) in spokes.iter().enumerate() {
        tree.insert(&[], edge, id as i64).unwrap();
    }

    let mut hits = IdCollector::new();
    tree.intersects_with_query(&Region::new([3.0, 3.0], [11.0, 5.0]), &mut hits)
        .unwrap();
    let mut ids = hits.into_ids();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1]);

    assert!(tree.delete(&spokes[1], 1).unwrap());
    let mut hits = IdCollector::new();
    tree.intersects_with_query(&Region::new([3.0, 3.0], [11.0, 5.0]), &mut hits)
        .unwrap();
    assert_eq!(hits.ids(), &[0]);
}

#[test]
fn face_bounds_cover_every_vertex() {
    let face = Face::new(vec![
        Point::new([2.0, 1.0]),
        Point::new([6.0, 2.0]),
        Point::new([4.0, 5.0]),
    ]);
    assert_eq!(face.mbr(), Region::new([2.0, 1.0], [6.0, 5.0]));

    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();
    let mut payload = Vec::new();
    face.encode_to(&mut payload);
    tree.insert(&payload, &face, 7).unwrap();

    // found through its bounds, and the payload round-trips to the shape
    let mut hits = IdCollector::new();
    tree.intersects_with_query(&Region::new([5.0, 4.0], [8.0, 8.0]), &mut hits)
        .unwrap();
    assert_eq!(hits.ids(), &[7]);

    struct Decode {
        face: Option<Face>,
    }
    impl rectdb::query::Visitor for Decode {
        fn visit_data(&mut self, data: &DataEntry<'_>) {
            self.face = Some(Face::decode(data.data).unwrap());
        }
    }
    let mut decode = Decode { face: None };
    tree.point_location_query(&Point::new([4.0, 3.0]), &mut decode)
        .unwrap();
    assert_eq!(decode.face.unwrap(), face);
}

/// A comparator that ranks leaf entries by the exact point stored in the
/// payload rather than by MBR distance.
struct PayloadDistance;

impl NearestNeighborComparator for PayloadDistance {
    fn mbr_distance(&mut self, query: &dyn Shape, mbr: &Region) -> f64 {
        query.min_distance_to_region(mbr)
    }

    fn data_distance(&mut self, query: &dyn Shape, data: &DataEntry<'_>) -> f64 {
        let exact = Point::decode(data.data).unwrap();
        query.min_distance_to_region(&exact.mbr())
    }
}

#[test]
fn custom_comparator_ranks_by_exact_shape() {
    let mut tree = RTree::create(MemoryStorageManager::new(), capacity_four()).unwrap();

    // each entry is indexed under a fat box, but the payload holds the
    // actual point sitting in one corner of it
    let samples = [
        (0i64, Point::new([9.0, 9.0])),
        (1, Point::new([4.0, 0.0])),
        (2, Point::new([12.0, 12.0])),
    ];
    for (id, point) in &samples {
        let c = point.coords();
        let fat = Region::new([c[0] - 4.0, c[1] - 4.0], [c[0] + 4.0, c[1] + 4.0]);
        let mut payload = Vec::new();
        point.encode_to(&mut payload);
        tree.insert(&payload, &fat, *id).unwrap();
    }

    // by box distance the origin is inside the boxes of 1 AND 0's box is
    // closer than its point; the exact ranking must come out 1, 0, 2
    let mut hits = IdCollector::new();
    tree.nearest_neighbor_query_with(
        3,
        &Point::new([0.0, 0.0]),
        &mut hits,
        &mut PayloadDistance,
    )
    .unwrap();
    assert_eq!(hits.ids(), &[1, 0, 2]);
}
