mod artifact;
mod metadata;

pub use artifact::{resolve_path, resolve_path_or_raw, MavenArtifact};
pub use metadata::{compare_versions, MavenMetadata};

/// Well-known Maven repositories used by Minecraft ecosystem.
pub const MOJANG_LIBRARIES: &str = "https://libraries.minecraft.net";
pub const FORGE_MAVEN: &str = "https://maven.minecraftforge.net";
pub const FABRIC_MAVEN: &str = "https://maven.fabricmc.net";
pub const QUILT_MAVEN: &str = "https://maven.quiltmc.org/repository/release";
pub const NEOFORGE_MAVEN: &str = "https://maven.neoforged.net/releases";
