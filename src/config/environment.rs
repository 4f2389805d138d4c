//! Filesystem and network layout the workers are launched against.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::StressError;

/// Library search path variables extended for child processes.
const LIBRARY_PATH_VARS: [&str; 4] = ["PATH", "DYLD_LIBRARY_PATH", "LD_LIBRARY_PATH", "SHLIB_PATH"];

/// Addresses of one relay instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEndpoint {
    /// Relay number; also selects `stress_relay_<id>.ini` and
    /// `participant_relay_<id>.ini`.
    pub id: u32,
    /// Port participants connect to.
    pub vertical_address: String,
    /// Address relays use to talk to each other.
    pub horizontal_address: String,
    /// Meta-discovery HTTP address.
    pub meta_discovery_address: String,
}

impl RelayEndpoint {
    /// The two-relay layout used by the stress scenario.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                id: 1,
                vertical_address: "4444".into(),
                horizontal_address: "127.0.0.1:11444".into(),
                meta_discovery_address: "127.0.0.1:8081".into(),
            },
            Self {
                id: 2,
                vertical_address: "5444".into(),
                horizontal_address: "127.0.0.1:11544".into(),
                meta_discovery_address: "127.0.0.1:8082".into(),
            },
        ]
    }

    /// Config file participants use to reach this relay.
    pub fn participant_config(&self) -> String {
        format!("participant_relay_{}.ini", self.id)
    }
}

/// Where the provisioning step leaves identity and permission artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new("./DPM")
    }
}

impl ArtifactLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Identity CA certificate.
    pub fn identity_ca(&self) -> PathBuf {
        self.root.join("ca/identity/cert.pem")
    }

    /// Permissions CA certificate.
    pub fn permissions_ca(&self) -> PathBuf {
        self.root.join("ca/permissions/cert.pem")
    }

    /// Signed governance document.
    pub fn governance(&self) -> PathBuf {
        self.root.join("signed/governance.xml.p7s")
    }

    /// Certificate of identity `name`, e.g. `publisher_3`.
    pub fn identity_cert(&self, name: &str) -> PathBuf {
        self.root.join("identity").join(name).join("cert.pem")
    }

    /// Private key of identity `name`.
    pub fn identity_key(&self, name: &str) -> PathBuf {
        self.root.join("identity").join(name).join("key.pem")
    }

    /// Signed permissions of identity `name`.
    pub fn permissions(&self, name: &str) -> PathBuf {
        self.root.join("signed").join(format!("{name}_permissions.xml.p7s"))
    }

    /// Artifacts shared by every identity.
    pub fn shared(&self) -> Vec<PathBuf> {
        vec![self.identity_ca(), self.permissions_ca(), self.governance()]
    }

    /// Artifacts belonging to identity `name`.
    pub fn identity(&self, name: &str) -> Vec<PathBuf> {
        vec![
            self.identity_cert(name),
            self.identity_key(name),
            self.permissions(name),
        ]
    }
}

/// Fail with the first path in `paths` that does not exist.
pub fn require_files<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Result<(), StressError> {
    match paths.into_iter().find(|p| !p.exists()) {
        Some(missing) => Err(StressError::MissingArtifact(missing.clone())),
        None => Ok(()),
    }
}

/// Launch environment shared by every policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressEnvironment {
    /// DDS installation root.
    pub dds_root: PathBuf,
    /// Relays to start and to spread participants over.
    pub relays: Vec<RelayEndpoint>,
    /// Security artifact layout.
    pub artifacts: ArtifactLayout,
    /// Environment overrides passed to every child.
    pub child_env: Vec<(String, String)>,
    /// Check artifacts exist before each launch.
    pub verify_artifacts: bool,
}

impl StressEnvironment {
    /// Environment rooted at `dds_root` with the default relays and artifact
    /// layout, computing library paths from `lookup`.
    pub fn new(dds_root: impl Into<PathBuf>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let dds_root = dds_root.into();
        let child_env = library_env(&dds_root, lookup);
        Self {
            dds_root,
            relays: RelayEndpoint::defaults(),
            artifacts: ArtifactLayout::default(),
            child_env,
            verify_artifacts: true,
        }
    }

    /// Environment from the current process: `DDS_ROOT` must be set.
    pub fn from_process_env() -> Result<Self, StressError> {
        let dds_root = std::env::var_os("DDS_ROOT")
            .ok_or_else(|| StressError::InvalidConfig("DDS_ROOT is not set".into()))?;
        Ok(Self::new(dds_root, |name| std::env::var(name).ok()))
    }

    /// Skip artifact existence checks (dry runs).
    #[must_use]
    pub fn without_artifact_checks(mut self) -> Self {
        self.verify_artifacts = false;
        self
    }

    /// Relay executable.
    pub fn relay_program(&self) -> PathBuf {
        self.dds_root.join("bin").join("RtpsRelay")
    }

    /// Check that `paths` exist, unless checks are disabled.
    pub fn require<'a>(
        &self,
        paths: impl IntoIterator<Item = &'a PathBuf>,
    ) -> Result<(), StressError> {
        if self.verify_artifacts {
            require_files(paths)
        } else {
            Ok(())
        }
    }

    /// Validate the relay table.
    pub fn validate(&self) -> Result<(), StressError> {
        if self.relays.is_empty() {
            return Err(StressError::InvalidConfig("at least one relay must be defined".into()));
        }
        Ok(())
    }
}

/// Library path overrides: each variable already set in `lookup` gets the
/// test's IDL and common library directories appended.
fn library_env(dds_root: &Path, lookup: impl Fn(&str) -> Option<String>) -> Vec<(String, String)> {
    let dcps = dds_root.join("tests").join("DCPS");
    let extra = [dcps.join("ConsolidatedMessengerIdl"), dcps.join("common")];
    let sep = if cfg!(windows) { ';' } else { ':' };
    LIBRARY_PATH_VARS
        .iter()
        .filter_map(|name| {
            let mut value = lookup(name)?;
            for dir in &extra {
                value.push(sep);
                value.push_str(&dir.to_string_lossy());
            }
            Some(((*name).to_string(), value))
        })
        .collect()
}
