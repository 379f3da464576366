//! Command-line assembly for the streaming server.
//!
//! The server is started as
//! `<executable> [-DV] [-cluster_id <id>] [-p <port>]`. Flags always appear in
//! that order so the same configuration yields the same argv every time.
//!
//! Values are appended as discrete tokens: a cluster id containing spaces stays
//! a single argv entry. [`ArgumentList::push_split`] keeps the older
//! whitespace-splitting behaviour for callers that pass pre-joined flag strings.

use crate::{CLUSTER_ID_FLAG, PORT_FLAG, PRIVILEGED_PORT_MAX, VERBOSE_FLAG};

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::path::{Path, PathBuf};

/// Ordered argv for one server launch. The first token is always the executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList {
    tokens: Vec<String>,
}

impl ArgumentList {
    pub fn new(executable: impl AsRef<Path>) -> Self {
        Self {
            tokens: vec![executable.as_ref().to_string_lossy().into_owned()],
        }
    }

    pub fn push(&mut self, token: impl Into<String>) -> &mut Self {
        self.tokens.push(token.into());
        self
    }

    /// Append a flag and its value as two tokens.
    pub fn push_flag(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.tokens.push(flag.to_string());
        self.tokens.push(value.into());
        self
    }

    /// Append `raw` split on runs of whitespace, dropping empty pieces.
    ///
    /// `"-p  4222"` becomes `["-p", "4222"]`; `"   "` appends nothing.
    pub fn push_split(&mut self, raw: &str) -> &mut Self {
        self.tokens.extend(raw.split_whitespace().map(str::to_string));
        self
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn program(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    /// Everything after the executable.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

impl Display for ArgumentList {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.tokens.join(" "))
    }
}

/// Drop ports the server must not be asked to bind.
///
/// Anything at or below [`PRIVILEGED_PORT_MAX`] is treated as if no port was given.
pub fn normalize_port(port: Option<u16>) -> Option<u16> {
    port.filter(|p| *p > PRIVILEGED_PORT_MAX)
}

/// Builder producing the [`ArgumentList`] for a server launch.
///
/// Pure: calling [`ArgumentBuilder::build`] twice yields identical lists.
#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    executable: PathBuf,
    verbose: bool,
    cluster_id: Option<String>,
    port: Option<u16>,
}

impl ArgumentBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            verbose: false,
            cluster_id: None,
            port: None,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn build(&self) -> ArgumentList {
        let mut arguments = ArgumentList::new(&self.executable);

        if self.verbose {
            arguments.push(VERBOSE_FLAG);
        }

        if let Some(cluster_id) = &self.cluster_id {
            arguments.push_flag(CLUSTER_ID_FLAG, cluster_id.as_str());
        }

        if let Some(port) = normalize_port(self.port) {
            arguments.push_flag(PORT_FLAG, port.to_string());
        }

        arguments
    }
}
