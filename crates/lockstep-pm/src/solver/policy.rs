use std::cmp::Ordering;

use lockstep_semver::compare_versions;

use super::pool::{PackageId, Pool};

/// Policy for selecting between candidate packages.
///
/// When multiple packages can satisfy a requirement, the policy
/// determines which one to try first.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Prefer stable versions over dev
    pub prefer_stable: bool,
    /// Prefer lowest versions (for testing)
    pub prefer_lowest: bool,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set preference for stable versions
    pub fn prefer_stable(mut self, prefer: bool) -> Self {
        self.prefer_stable = prefer;
        self
    }

    /// Set preference for lowest versions
    pub fn prefer_lowest(mut self, prefer: bool) -> Self {
        self.prefer_lowest = prefer;
        self
    }

    /// Sort candidates by preference (best first).
    ///
    /// Stability first when `prefer_stable` is set, then version, then
    /// repository priority. Ties keep pool order.
    pub fn select_preferred(&self, pool: &Pool, candidates: &[PackageId]) -> Vec<PackageId> {
        let mut sorted: Vec<_> = candidates.to_vec();
        sorted.sort_by(|&a, &b| self.compare(pool, a, b));
        sorted
    }

    /// Select a single best package from candidates
    pub fn select_best(&self, pool: &Pool, candidates: &[PackageId]) -> Option<PackageId> {
        self.select_preferred(pool, candidates).into_iter().next()
    }

    fn compare(&self, pool: &Pool, a: PackageId, b: PackageId) -> Ordering {
        let (Some(pa), Some(pb)) = (pool.entry(a), pool.entry(b)) else {
            return pool.entry(b).is_some().cmp(&pool.entry(a).is_some());
        };

        if self.prefer_stable {
            let stability_cmp = pa.stability().priority().cmp(&pb.stability().priority());
            if stability_cmp != Ordering::Equal {
                return stability_cmp;
            }
        }

        let version_cmp = compare_versions(pa.version(), pb.version());
        let version_cmp = if self.prefer_lowest {
            version_cmp
        } else {
            version_cmp.reverse()
        };

        version_cmp.then_with(|| pool.priority(a).cmp(&pool.priority(b)))
    }
}
