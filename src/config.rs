use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Insertion policy of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeVariant {
    Linear,
    Quadratic,
    RStar,
}

impl TreeVariant {
    pub(crate) fn to_tag(self) -> u32 {
        match self {
            TreeVariant::Linear => 0,
            TreeVariant::Quadratic => 1,
            TreeVariant::RStar => 2,
        }
    }

    pub(crate) fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(TreeVariant::Linear),
            1 => Ok(TreeVariant::Quadratic),
            2 => Ok(TreeVariant::RStar),
            _ => Err(Error::NotSupported("unrecognized tree variant tag")),
        }
    }
}

/// Tunables fixed at tree creation and persisted in the header record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RTreeConfig {
    pub variant: TreeVariant,
    /// Minimum fraction of capacity each non-root node should hold.
    pub fill_factor: f64,
    pub index_capacity: u32,
    pub leaf_capacity: u32,
    /// Candidate count inspected by the R* subtree choice at leaf parents.
    pub near_minimum_overlap_factor: u32,
    pub split_distribution_factor: f64,
    pub reinsert_factor: f64,
    /// Keep node MBRs equal to the exact union of their children.
    pub tight_mbrs: bool,
}

impl Default for RTreeConfig {
    fn default() -> Self {
        Self {
            variant: TreeVariant::RStar,
            fill_factor: 0.7,
            index_capacity: 10,
            leaf_capacity: 10,
            near_minimum_overlap_factor: 32,
            split_distribution_factor: 0.4,
            reinsert_factor: 0.3,
            tight_mbrs: true,
        }
    }
}

impl RTreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.index_capacity < 2 {
            return Err(Error::IllegalArgument(format!(
                "index capacity must be at least 2, got {}",
                self.index_capacity
            )));
        }
        if self.leaf_capacity < 2 {
            return Err(Error::IllegalArgument(format!(
                "leaf capacity must be at least 2, got {}",
                self.leaf_capacity
            )));
        }
        if !(self.fill_factor > 0.0 && self.fill_factor <= 1.0) {
            return Err(Error::IllegalArgument(format!(
                "fill factor must be in (0, 1], got {}",
                self.fill_factor
            )));
        }
        if self.near_minimum_overlap_factor < 1 {
            return Err(Error::IllegalArgument(
                "near-minimum-overlap factor must be positive".to_string(),
            ));
        }
        if !(self.split_distribution_factor > 0.0 && self.split_distribution_factor <= 0.5) {
            return Err(Error::IllegalArgument(format!(
                "split distribution factor must be in (0, 0.5], got {}",
                self.split_distribution_factor
            )));
        }
        if !(self.reinsert_factor > 0.0 && self.reinsert_factor < 1.0) {
            return Err(Error::IllegalArgument(format!(
                "reinsert factor must be in (0, 1), got {}",
                self.reinsert_factor
            )));
        }
        Ok(())
    }

    pub(crate) fn minimum_load(&self, capacity: u32) -> u32 {
        (f64::from(capacity) * self.fill_factor).floor() as u32
    }
}
