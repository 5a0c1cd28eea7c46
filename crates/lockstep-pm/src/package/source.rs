/// Where a package's sources can be checked out from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub source_type: String,
    pub url: String,
    pub reference: String,
}

impl Source {
    pub fn new(
        source_type: impl Into<String>,
        url: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            url: url.into(),
            reference: reference.into(),
        }
    }
}

/// Where a package's distribution archive (or directory) can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dist {
    pub dist_type: String,
    pub url: String,
    pub reference: Option<String>,
    pub shasum: Option<String>,
}

impl Dist {
    pub fn new(dist_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            dist_type: dist_type.into(),
            url: url.into(),
            reference: None,
            shasum: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_shasum(mut self, shasum: impl Into<String>) -> Self {
        self.shasum = Some(shasum.into());
        self
    }
}
