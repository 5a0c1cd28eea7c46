//! Package sources: the local store, platform facts and remote candidate sets.

mod array;
mod installed;
mod platform;

pub use array::ArrayRepository;
pub use installed::InstalledRepository;
pub use platform::PlatformRepository;
