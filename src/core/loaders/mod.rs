pub mod cache;
pub mod context;
pub mod fabric;
pub mod forge;
pub mod install_profile;
pub mod installer;
pub mod kind;
pub mod neoforge;
pub mod processors;
pub mod profile;
pub mod quilt;

pub use cache::{ProfileCache, ProfileKey};
pub use context::{select_version, InstallContext, LoaderVersion};
pub use installer::{Installer, LoaderResolver, LoaderSetup, LoaderSource};
pub use kind::LoaderType;
pub use processors::{
    JavaProcessorRunner, ProcessorExecutor, ProcessorInvocation, ProcessorRunner,
};
pub use profile::{DataField, DataValue, LibraryEntry, LoaderProfile, Processor};
