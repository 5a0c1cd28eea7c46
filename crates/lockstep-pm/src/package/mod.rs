//! Package model: packages, their links, aliases and the root package.

mod alias;
mod convert;
mod link;
mod package;
mod root;
mod source;

pub use alias::{AliasPackage, RootAlias};
pub use link::{Link, LinkType, PackageLinks};
pub use package::{Abandoned, Package};
pub use root::RootPackage;
pub use source::{Dist, Source};
