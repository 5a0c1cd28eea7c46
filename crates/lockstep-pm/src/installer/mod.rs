//! The install/update run and its stages.
//!
//! An [`Installer`] run builds the request ([`RequestBuilder`], narrowed by
//! the [`UpdateWhitelistExpander`]), keeps dev packages honest around the
//! solver ([`DevPackageReconciler`]), applies the operations one by one
//! ([`OperationExecutor`]) and hands over to the lock manager.

mod dev_packages;
mod executor;
mod installer;
mod materializer;
mod report;
mod request_builder;
mod whitelist;


pub use dev_packages::{DevPackageReconciler, ReconcilePass};
pub use executor::OperationExecutor;
pub use installer::Installer;
pub use materializer::{Materializer, NoopMaterializer, VendorMaterializer};
pub use report::{Advisory, InstallReport, Suggestion};
pub use request_builder::RequestBuilder;
pub use whitelist::{UpdateWhitelist, UpdateWhitelistExpander};

pub(crate) use request_builder::require_links;
