//! Guided tour of the index:
//! 1. Create a paged store and an R*-tree on top of it.
//! 2. Insert tagged rectangles.
//! 3. Run the query families (range, point, nearest-neighbor, self-join).
//! 4. Delete, flush, reopen, and validate.
//!
//! Run:
//!   cargo run --example tour

use rectdb::Result;
use rectdb::config::RTreeConfig;
use rectdb::disk::DiskStorageManager;
use rectdb::geometry::{Point, Region};
use rectdb::query::{DataEntry, IdCollector, Visitor};
use rectdb::rtree::RTree;
use tempfile::tempdir;

struct PairPrinter;

impl Visitor for PairPrinter {
    fn visit_pair(&mut self, first: &DataEntry<'_>, second: &DataEntry<'_>) {
        println!("  overlap: {} <-> {}", first.id, second.id);
    }
}

fn main() -> Result<()> {
    let dir = tempdir()?;
    let base = dir.path().join("tour");

    // 1. A fresh paged store, default 4 KiB pages, and a tree over it.
    let storage = DiskStorageManager::create(&base, 4096, 4096)?;
    let mut tree = RTree::create(storage, RTreeConfig::default())?;
    println!("created index at {}", base.display());

    // 2. A 10x10 grid of slightly overlapping rectangles, ids 0..100.
    for id in 0..100i64 {
        let x = (id % 10) as f64 * 2.0;
        let y = (id / 10) as f64 * 2.0;
        let mbr = Region::new([x, y], [x + 2.5, y + 2.5]);
        tree.insert(&id.to_le_bytes(), &mbr, id)?;
    }
    println!(
        "inserted {} rectangles, tree height {}",
        tree.statistics().data,
        tree.height()
    );

    // 3a. Everything intersecting a window.
    let mut hits = IdCollector::new();
    tree.intersects_with_query(&Region::new([3.0, 3.0], [7.0, 7.0]), &mut hits)?;
    println!("window query matched {} rectangles", hits.ids().len());

    // 3b. Who covers a point?
    let mut hits = IdCollector::new();
    tree.point_location_query(&Point::new([9.1, 9.1]), &mut hits)?;
    println!("point (9.1, 9.1) is covered by {:?}", hits.ids());

    // 3c. The five nearest rectangles to a corner.
    let mut hits = IdCollector::new();
    tree.nearest_neighbor_query(5, &Point::new([0.0, 0.0]), &mut hits)?;
    println!("5 nearest to the origin: {:?}", hits.ids());

    // 3d. Every overlapping pair inside a small window.
    println!("self-join in [0,0]x[5,5]:");
    tree.self_join_query(&Region::new([0.0, 0.0], [5.0, 5.0]), &mut PairPrinter)?;

    // 4. Remove a row, persist, reopen, and check the bookkeeping.
    for id in 0..10i64 {
        let x = (id % 10) as f64 * 2.0;
        let mbr = Region::new([x, 0.0], [x + 2.5, 2.5]);
        tree.delete(&mbr, id)?;
    }
    tree.flush()?;
    println!("deleted the first row, {} entries remain", tree.statistics().data);

    let storage = tree.into_storage();
    drop(storage);

    let storage = DiskStorageManager::open(&base, 4096)?;
    let mut tree = RTree::open(storage)?;
    let data = tree.statistics().data;
    let nodes = tree.statistics().nodes;
    let height = tree.height();
    let consistent = tree.validate()?;
    println!(
        "reopened: {} entries, {} nodes, height {}, consistent: {}",
        data, nodes, height, consistent
    );

    Ok(())
}
