use crate::args::{ArgumentBuilder, ArgumentList, normalize_port};

use std::path::Path;

use serde::{Deserialize, Serialize};

/// What the server should be started with.
///
/// Every combination of fields is accepted. A port at or below 1023 is kept
/// as given but treated as unset when arguments are built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default)]
    pub cluster_id: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub verbose: bool,
}

impl ServerConfig {
    pub fn with_cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The port that will actually be passed to the server, if any.
    pub fn effective_port(&self) -> Option<u16> {
        normalize_port(self.port)
    }

    pub fn arguments(&self, executable: &Path) -> ArgumentList {
        let mut builder = ArgumentBuilder::new(executable).with_verbose(self.verbose);

        if let Some(cluster_id) = &self.cluster_id {
            builder = builder.with_cluster_id(cluster_id.as_str());
        }

        if let Some(port) = self.port {
            builder = builder.with_port(port);
        }

        builder.build()
    }
}
