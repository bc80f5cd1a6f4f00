//! Node split algorithms, operating on the oversized entry slice a node
//! holds while a split is staged (`capacity + 1` entries).

use crate::DIMENSION;
use crate::config::{RTreeConfig, TreeVariant};
use crate::geometry::Region;
use crate::node::Entry;

pub(crate) struct SplitGroups {
    pub group1: Vec<usize>,
    pub group2: Vec<usize>,
}

pub(crate) fn split_entries(
    entries: &[Entry],
    capacity: u32,
    config: &RTreeConfig,
) -> SplitGroups {
    match config.variant {
        TreeVariant::Linear | TreeVariant::Quadratic => {
            guttman_split(entries, capacity, config)
        }
        TreeVariant::RStar => rstar_split(entries, config),
    }
}

/// Seed-and-distribute split used by the linear and quadratic variants.
fn guttman_split(entries: &[Entry], capacity: u32, config: &RTreeConfig) -> SplitGroups {
    let minimum_load = config.minimum_load(capacity) as usize;
    let total = entries.len();
    let mut mask = vec![false; total];

    let (seed1, seed2) = pick_seeds(entries, config.variant);
    let mut group1 = vec![seed1];
    let mut group2 = vec![seed2];
    mask[seed1] = true;
    mask[seed2] = true;

    let mut mbr1 = entries[seed1].mbr;
    let mut mbr2 = entries[seed2].mbr;
    let mut remaining = total - 2;

    while remaining > 0 {
        if minimum_load.saturating_sub(group1.len()) == remaining {
            // the rest must go to group 1 to reach the minimum load
            for (i, seen) in mask.iter_mut().enumerate() {
                if !*seen {
                    group1.push(i);
                    *seen = true;
                    remaining -= 1;
                }
            }
        } else if minimum_load.saturating_sub(group2.len()) == remaining {
            for (i, seen) in mask.iter_mut().enumerate() {
                if !*seen {
                    group2.push(i);
                    *seen = true;
                    remaining -= 1;
                }
            }
        } else {
            // pick the unassigned entry with the largest preference gap;
            // the linear variant settles for the first unassigned one
            let a1 = mbr1.area();
            let a2 = mbr2.area();
            let mut best: Option<(usize, f64, f64)> = None;
            let mut max_gap = -f64::MAX;

            for (i, entry) in entries.iter().enumerate() {
                if mask[i] {
                    continue;
                }
                let mut c1 = mbr1;
                c1.combine(&entry.mbr);
                let mut c2 = mbr2;
                c2.combine(&entry.mbr);
                let d1 = c1.area() - a1;
                let d2 = c2.area() - a2;
                let gap = (d1 - d2).abs();
                if gap > max_gap {
                    max_gap = gap;
                    best = Some((i, d1, d2));
                    if matches!(config.variant, TreeVariant::Linear | TreeVariant::RStar) {
                        break;
                    }
                }
            }
            // remaining > 0 guarantees an unassigned candidate
            let (sel, d1, d2) = best.unwrap();

            let to_first = if d1 < d2 {
                true
            } else if d2 < d1 {
                false
            } else if a1 < a2 {
                true
            } else if a2 < a1 {
                false
            } else {
                group1.len() <= group2.len()
            };

            mask[sel] = true;
            remaining -= 1;
            if to_first {
                group1.push(sel);
                mbr1.combine(&entries[sel].mbr);
            } else {
                group2.push(sel);
                mbr2.combine(&entries[sel].mbr);
            }
        }
    }

    SplitGroups { group1, group2 }
}

/// R* split: choose the axis minimizing the summed margin over all
/// distributions, then the position on that axis minimizing overlap.
fn rstar_split(entries: &[Entry], config: &RTreeConfig) -> SplitGroups {
    let total = entries.len();
    let node_spf = ((total as f64 * config.split_distribution_factor).floor() as usize).max(1);
    let split_distribution = total - 2 * node_spf + 2;

    let mut minimum_margin = f64::MAX;
    let mut split_axis = 0;
    let mut sort_low = true;

    for dim in 0..DIMENSION {
        let low_order = sorted_order(entries, dim, true);
        let high_order = sorted_order(entries, dim, false);

        let mut margin_low = 0.0;
        let mut margin_high = 0.0;
        for j in 1..=split_distribution {
            let cut = node_spf - 1 + j;
            if cut >= total {
                break;
            }
            margin_low += halves_margin(entries, &low_order, cut);
            margin_high += halves_margin(entries, &high_order, cut);
        }

        let margin = margin_low.min(margin_high);
        if margin < minimum_margin {
            minimum_margin = margin;
            split_axis = dim;
            sort_low = margin_low < margin_high;
        }
    }

    let order = sorted_order(entries, split_axis, sort_low);

    let mut min_overlap = f64::MAX;
    let mut min_area = f64::MAX;
    let mut split_point = 1;
    for j in 1..=split_distribution {
        let cut = node_spf - 1 + j;
        if cut >= total {
            break;
        }
        let bb1 = union_of(entries, &order[..cut]);
        let bb2 = union_of(entries, &order[cut..]);
        let overlap = bb1.intersecting_area(&bb2);
        if overlap < min_overlap {
            split_point = j;
            min_overlap = overlap;
            min_area = bb1.area() + bb2.area();
        } else if overlap == min_overlap {
            let area = bb1.area() + bb2.area();
            if area < min_area {
                split_point = j;
                min_area = area;
            }
        }
    }

    let cut = node_spf - 1 + split_point;
    SplitGroups {
        group1: order[..cut].to_vec(),
        group2: order[cut..].to_vec(),
    }
}

fn sorted_order(entries: &[Entry], dim: usize, by_low: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| {
        let (ka, kb) = if by_low {
            (entries[a].mbr.low()[dim], entries[b].mbr.low()[dim])
        } else {
            (entries[a].mbr.high()[dim], entries[b].mbr.high()[dim])
        };
        ka.total_cmp(&kb)
    });
    order
}

fn union_of(entries: &[Entry], indices: &[usize]) -> Region {
    let mut mbr = Region::infinite();
    for &i in indices {
        mbr.combine(&entries[i].mbr);
    }
    mbr
}

fn halves_margin(entries: &[Entry], order: &[usize], cut: usize) -> f64 {
    union_of(entries, &order[..cut]).margin() + union_of(entries, &order[cut..]).margin()
}

/// Seed pair for the guttman distribution: maximal normalized separation for
/// linear (and R*), maximal waste for quadratic.
fn pick_seeds(entries: &[Entry], variant: TreeVariant) -> (usize, usize) {
    let total = entries.len();
    match variant {
        TreeVariant::Linear | TreeVariant::RStar => {
            let mut separation = -f64::MAX;
            let mut index1 = 0;
            let mut index2 = 0;

            for dim in 0..DIMENSION {
                let mut least_lower = entries[0].mbr.low()[dim];
                let mut greatest_upper = entries[0].mbr.high()[dim];
                let mut greatest_lower = 0;
                let mut least_upper = 0;

                for (i, entry) in entries.iter().enumerate().skip(1) {
                    let low = entry.mbr.low()[dim];
                    let high = entry.mbr.high()[dim];
                    if low > entries[greatest_lower].mbr.low()[dim] {
                        greatest_lower = i;
                    }
                    if high < entries[least_upper].mbr.high()[dim] {
                        least_upper = i;
                    }
                    least_lower = least_lower.min(low);
                    greatest_upper = greatest_upper.max(high);
                }

                let mut width = greatest_upper - least_lower;
                if width <= 0.0 {
                    width = 1.0;
                }
                let f = (entries[greatest_lower].mbr.low()[dim]
                    - entries[least_upper].mbr.high()[dim])
                    / width;
                if f > separation {
                    index1 = least_upper;
                    index2 = greatest_lower;
                    separation = f;
                }
            }

            if index1 == index2 {
                if index2 == 0 {
                    index2 += 1;
                } else {
                    index2 -= 1;
                }
            }
            (index1, index2)
        }
        TreeVariant::Quadratic => {
            let mut inefficiency = -f64::MAX;
            let mut index1 = 0;
            let mut index2 = 1;

            for i in 0..total - 1 {
                let area_i = entries[i].mbr.area();
                for j in i + 1..total {
                    let mut combined = entries[i].mbr;
                    combined.combine(&entries[j].mbr);
                    let waste = combined.area() - area_i - entries[j].mbr.area();
                    if waste > inefficiency {
                        inefficiency = waste;
                        index1 = i;
                        index2 = j;
                    }
                }
            }
            (index1, index2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(lx: f64, ly: f64, hx: f64, hy: f64) -> Entry {
        Entry::new(Region::new([lx, ly], [hx, hy]), 0, Vec::new())
    }

    fn corners_and_center() -> Vec<Entry> {
        vec![
            entry(0.0, 0.0, 1.0, 1.0),
            entry(10.0, 0.0, 11.0, 1.0),
            entry(0.0, 10.0, 1.0, 11.0),
            entry(10.0, 10.0, 11.0, 11.0),
            entry(5.0, 5.0, 6.0, 6.0),
        ]
    }

    #[test]
    fn quadratic_seeds_are_the_farthest_pair() {
        let entries = corners_and_center();
        let (s1, s2) = pick_seeds(&entries, TreeVariant::Quadratic);
        // any two opposite corners waste the most area
        assert_ne!(s1, s2);
        assert_ne!(s1, 4);
        assert_ne!(s2, 4);
    }

    #[test]
    fn linear_seeds_never_coincide() {
        let same = vec![
            entry(0.0, 0.0, 1.0, 1.0),
            entry(0.0, 0.0, 1.0, 1.0),
            entry(0.0, 0.0, 1.0, 1.0),
        ];
        let (s1, s2) = pick_seeds(&same, TreeVariant::Linear);
        assert_ne!(s1, s2);
    }

    #[test]
    fn groups_partition_all_entries() {
        let entries = corners_and_center();
        for variant in [
            TreeVariant::Linear,
            TreeVariant::Quadratic,
            TreeVariant::RStar,
        ] {
            let config = RTreeConfig {
                variant,
                ..RTreeConfig::default()
            };
            let groups = split_entries(&entries, 4, &config);
            let mut all: Vec<usize> = groups
                .group1
                .iter()
                .chain(groups.group2.iter())
                .copied()
                .collect();
            all.sort_unstable();
            assert_eq!(all, vec![0, 1, 2, 3, 4], "variant {variant:?}");
            assert!(!groups.group1.is_empty());
            assert!(!groups.group2.is_empty());
        }
    }

    #[test]
    fn guttman_split_honors_minimum_load() {
        let entries = corners_and_center();
        let config = RTreeConfig {
            variant: TreeVariant::Quadratic,
            ..RTreeConfig::default()
        };
        let groups = split_entries(&entries, 4, &config);
        let min_load = config.minimum_load(4) as usize;
        assert!(groups.group1.len() >= min_load);
        assert!(groups.group2.len() >= min_load);
    }

    #[test]
    fn rstar_split_separates_along_the_long_axis() {
        // two clusters far apart on x
        let entries = vec![
            entry(0.0, 0.0, 1.0, 1.0),
            entry(0.5, 0.2, 1.5, 1.2),
            entry(1.0, 0.4, 2.0, 1.4),
            entry(100.0, 0.0, 101.0, 1.0),
            entry(100.5, 0.2, 101.5, 1.2),
        ];
        let groups = split_entries(&entries, 4, &RTreeConfig::default());
        let left = union_of(&entries, &groups.group1);
        let right = union_of(&entries, &groups.group2);
        assert_eq!(left.intersecting_area(&right), 0.0);
    }
}
