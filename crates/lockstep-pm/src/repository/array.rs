use std::sync::Arc;

use crate::package::Package;

/// A named set of remote candidates, as served by a package repository
#[derive(Debug, Clone)]
pub struct ArrayRepository {
    name: String,
    packages: Vec<Arc<Package>>,
}

impl ArrayRepository {
    pub fn new(name: impl Into<String>, packages: Vec<Package>) -> Self {
        Self {
            name: name.into(),
            packages: packages.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }

    pub fn add_package(&mut self, package: Package) {
        self.packages.push(Arc::new(package));
    }
}
