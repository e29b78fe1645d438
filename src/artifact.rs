// Artifact kinds and the remote layout they are published under.

use std::fmt;

/// One of the files making up an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pom,
    Jar,
    StudioPlugin,
}

impl ArtifactKind {
    /// Upload order.
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Pom,
        ArtifactKind::Jar,
        ArtifactKind::StudioPlugin,
    ];

    /// Substring a local file name must contain to be offered for this kind.
    pub fn marker(self) -> &'static str {
        match self {
            ArtifactKind::Pom => ".pom",
            ArtifactKind::Jar => ".jar",
            ArtifactKind::StudioPlugin => "studio-plugin.zip",
        }
    }

    /// Appended to `{assetId}-{version}` in the remote file name.
    pub fn remote_suffix(self) -> &'static str {
        match self {
            ArtifactKind::Pom => ".pom",
            ArtifactKind::Jar => ".jar",
            ArtifactKind::StudioPlugin => "-studio-plugin.zip",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            ArtifactKind::Pom => "Select POM file",
            ArtifactKind::Jar => "Select JAR file",
            ArtifactKind::StudioPlugin => "Select Studio Plugin file",
        }
    }

    /// A missing JAR is tolerated; the other kinds must be present.
    pub fn is_required(self) -> bool {
        !matches!(self, ArtifactKind::Jar)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Pom => "POM",
            ArtifactKind::Jar => "JAR",
            ArtifactKind::StudioPlugin => "Studio plugin",
        };
        f.write_str(name)
    }
}

/// Fully resolved location of an asset version in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCoordinates {
    pub organization_id: String,
    pub group_id: String,
    pub asset_id: String,
    pub version: String,
}

impl AssetCoordinates {
    /// `{base}/api/v1/organizations/{org}/maven/{group}/{asset}/{version}/{asset}-{version}{suffix}`
    pub fn upload_url(&self, maven_base: &str, kind: ArtifactKind) -> String {
        format!(
            "{}/api/v1/organizations/{}/maven/{}/{}/{}/{}-{}{}",
            maven_base,
            self.organization_id,
            self.group_id,
            self.asset_id,
            self.version,
            self.asset_id,
            self.version,
            kind.remote_suffix()
        )
    }
}
