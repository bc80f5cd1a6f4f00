use serde::Serialize;

/// Operation counters and structural bookkeeping for one tree.
///
/// `nodes`, `data`, `tree_height` and `nodes_in_level` are persisted in the
/// header record; the remaining counters describe the current session only.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Statistics {
    pub reads: u64,
    pub writes: u64,
    pub splits: u64,
    pub adjustments: u64,
    pub query_results: u64,
    pub nodes: u32,
    pub data: u64,
    pub tree_height: u32,
    pub nodes_in_level: Vec<u32>,
}
