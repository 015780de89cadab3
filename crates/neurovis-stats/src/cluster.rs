//! Connected-component labeling and cluster-size thresholding
//!
//! A cluster is a maximal set of active voxels (finite, non-zero) connected
//! through the chosen neighborhood. Labeling is a single raster scan with a
//! disjoint-set forest, so the result is exact for any cluster shape.

use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::is_active;

/// Voxel neighborhood used to decide whether two voxels touch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connectivity {
    /// Shared face (6 neighbors)
    Face,
    /// Shared face or edge (18 neighbors)
    Edge,
    /// Shared face, edge or corner (26 neighbors)
    #[default]
    Vertex,
}

impl Connectivity {
    /// Number of neighbors of an interior voxel
    pub fn neighbor_count(&self) -> usize {
        match self {
            Connectivity::Face => 6,
            Connectivity::Edge => 18,
            Connectivity::Vertex => 26,
        }
    }

    /// Neighbor offsets that precede a voxel in raster (C) order
    fn backward_offsets(&self) -> Vec<[isize; 3]> {
        let max_axes = match self {
            Connectivity::Face => 1,
            Connectivity::Edge => 2,
            Connectivity::Vertex => 3,
        };

        let mut offsets = Vec::new();
        for di in -1isize..=1 {
            for dj in -1isize..=1 {
                for dk in -1isize..=1 {
                    let moved = [di, dj, dk].iter().filter(|d| **d != 0).count();
                    if moved == 0 || moved > max_axes {
                        continue;
                    }
                    if (di, dj, dk) < (0, 0, 0) {
                        offsets.push([di, dj, dk]);
                    }
                }
            }
        }
        offsets
    }
}

/// One connected cluster of active voxels
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cluster {
    /// Label in the owning [`ClusterMap`] (starts at 1)
    pub id: usize,
    /// Voxel indices in scan order
    pub voxels: Vec<[usize; 3]>,
    /// Voxel with the largest absolute value
    pub peak: [usize; 3],
    /// Value at `peak`
    pub peak_value: f64,
}

impl Cluster {
    /// Number of voxels in the cluster
    pub fn size(&self) -> usize {
        self.voxels.len()
    }

    /// Mean voxel index (center of mass with unit weights)
    pub fn centroid(&self) -> [f64; 3] {
        let n = self.voxels.len().max(1) as f64;
        let mut c = [0.0; 3];
        for v in &self.voxels {
            for axis in 0..3 {
                c[axis] += v[axis] as f64;
            }
        }
        c.map(|s| s / n)
    }
}

/// Labeled volume plus the clusters it contains
#[derive(Clone, Debug)]
pub struct ClusterMap {
    /// Per-voxel cluster id, 0 for inactive voxels
    pub labels: Array3<usize>,
    /// Clusters ordered by first appearance in scan order
    pub clusters: Vec<Cluster>,
}

impl ClusterMap {
    /// Number of clusters found
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster sizes indexed by `id - 1`
    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(Cluster::size).collect()
    }

    /// The largest cluster; ties go to the one found first
    pub fn largest(&self) -> Option<&Cluster> {
        self.clusters
            .iter()
            .fold(None, |best: Option<&Cluster>, c| match best {
                Some(b) if b.size() >= c.size() => Some(b),
                _ => Some(c),
            })
    }
}

/// Disjoint-set forest over flat voxel indices
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Label the connected clusters of active voxels
pub fn label_clusters(map: ArrayView3<f64>, connectivity: Connectivity) -> ClusterMap {
    let (nx, ny, nz) = map.dim();
    let flat = |i: usize, j: usize, k: usize| (i * ny + j) * nz + k;
    let offsets = connectivity.backward_offsets();

    let mut forest = DisjointSet::new(nx * ny * nz);

    for ((i, j, k), value) in map.indexed_iter() {
        if !is_active(*value) {
            continue;
        }
        for off in &offsets {
            let (ni, nj, nk) = (i as isize + off[0], j as isize + off[1], k as isize + off[2]);
            if ni < 0 || nj < 0 || nk < 0 {
                continue;
            }
            let (ni, nj, nk) = (ni as usize, nj as usize, nk as usize);
            if ni >= nx || nj >= ny || nk >= nz {
                continue;
            }
            if is_active(map[[ni, nj, nk]]) {
                forest.union(flat(i, j, k), flat(ni, nj, nk));
            }
        }
    }

    let mut labels = Array3::<usize>::zeros((nx, ny, nz));
    let mut root_to_id = std::collections::HashMap::new();
    let mut clusters: Vec<Cluster> = Vec::new();

    for ((i, j, k), value) in map.indexed_iter() {
        if !is_active(*value) {
            continue;
        }
        let root = forest.find(flat(i, j, k));
        let id = *root_to_id.entry(root).or_insert_with(|| {
            clusters.push(Cluster {
                id: clusters.len() + 1,
                voxels: Vec::new(),
                peak: [i, j, k],
                peak_value: *value,
            });
            clusters.len()
        });

        let cluster = &mut clusters[id - 1];
        cluster.voxels.push([i, j, k]);
        if value.abs() > cluster.peak_value.abs() {
            cluster.peak = [i, j, k];
            cluster.peak_value = *value;
        }
        labels[[i, j, k]] = id;
    }

    tracing::debug!(clusters = clusters.len(), ?connectivity, "labeled clusters");
    ClusterMap { labels, clusters }
}

/// Zero every cluster smaller than `threshold` voxels (26-connectivity)
pub fn correct_by_threshold(map: ArrayView3<f64>, threshold: usize) -> StatsResult<Array3<f64>> {
    correct_by_threshold_with(map, threshold, Connectivity::default())
}

/// Zero every cluster smaller than `threshold` voxels
///
/// Clusters with at least `threshold` voxels are copied unchanged, as are NaN
/// and zero voxels. The output always has the input's shape.
pub fn correct_by_threshold_with(
    map: ArrayView3<f64>,
    threshold: usize,
    connectivity: Connectivity,
) -> StatsResult<Array3<f64>> {
    if threshold == 0 {
        return Err(StatsError::InvalidThreshold {
            threshold,
            reason: "cluster size threshold must be at least 1 voxel".to_string(),
        });
    }

    let labeled = label_clusters(map, connectivity);
    let mut corrected = map.to_owned();
    let mut removed = 0usize;

    for cluster in labeled.clusters.iter().filter(|c| c.size() < threshold) {
        for v in &cluster.voxels {
            corrected[*v] = 0.0;
        }
        removed += 1;
    }

    tracing::info!(
        threshold,
        clusters = labeled.len(),
        removed,
        "finished cluster-size correction"
    );
    Ok(corrected)
}
