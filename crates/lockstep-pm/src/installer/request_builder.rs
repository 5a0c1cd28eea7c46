use lockstep_semver::VersionConstraint;

use crate::package::{Link, RootPackage};
use crate::repository::PlatformRepository;
use crate::solver::{Request, RequestError};

/// Turns the root package and the platform facts into solver directives.
///
/// The root is pinned to its exact version, and so is every platform fact the
/// root does not itself provide: neither is something the solver can change.
pub struct RequestBuilder<'a> {
    root: &'a RootPackage,
    platform: &'a PlatformRepository,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(root: &'a RootPackage, platform: &'a PlatformRepository) -> Self {
        Self { root, platform }
    }

    pub fn build(&self) -> Result<Request, RequestError> {
        let mut request = Request::new();
        let root = self.root.package();

        request.install(
            &root.name,
            VersionConstraint::exact(root.version.clone()).with_pretty_string(root.pretty_version.clone()),
        )?;

        for fact in self.platform.packages() {
            let provided_by_root = root
                .provides()
                .iter()
                .any(|link| link.targets(&fact.name) && link.constraint.satisfies(&fact.version));
            if provided_by_root {
                continue;
            }

            request.install(
                &fact.name,
                VersionConstraint::exact(fact.version.clone()).with_pretty_string(fact.pretty_version.clone()),
            )?;
        }

        Ok(request)
    }
}

/// Add an install directive per link, for names the request does not pin yet.
///
/// The root package's own requirements still hold for pinned names.
pub(crate) fn require_links<'l>(
    request: &mut Request,
    links: impl IntoIterator<Item = &'l Link>,
) -> Result<(), RequestError> {
    for link in links {
        if request.contains(&link.target) {
            continue;
        }
        request.install(&link.target, link.constraint.clone())?;
    }
    Ok(())
}
