//! Deployment models

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Maximum number of body bytes read as a secret
pub const MAX_SECRET_SIZE: usize = 64;

/// Request method that can trigger a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
}

impl RequestMethod {
    /// Methods allowed when a config does not restrict them
    pub const ALL: [RequestMethod; 2] = [RequestMethod::Get, RequestMethod::Post];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
        }
    }

    /// Parse an exact method name; anything else is `None`
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Convert a list of names, silently dropping unrecognized ones
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Vec<Self> {
        names
            .iter()
            .filter_map(|name| Self::parse(name.as_ref()))
            .collect()
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk shape of a `<deployment>.conf` file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeploymentFile {
    #[serde(default)]
    pub commands: Vec<String>,

    #[serde(default)]
    pub env: Vec<String>,

    pub dir: Option<String>,

    pub log_to: Option<String>,

    pub secret: Option<String>,

    pub secret_header: Option<String>,

    pub allowed_methods: Option<Vec<String>>,
}

/// Deployment configuration, built fresh for every request
#[derive(Debug, Clone, Default)]
pub struct DeploymentConfig {
    /// Directory holding the config file
    pub dir_name: PathBuf,

    /// Working directory of the command, defaults to `dir_name`
    pub run_dir: PathBuf,

    /// `<deployment>.conf`
    pub config_name: String,

    /// Executable followed by its arguments
    pub commands: Vec<String>,

    /// `KEY=VALUE` entries for the command environment
    pub env: Vec<String>,

    /// Append captured output here when set
    pub log_file: Option<PathBuf>,

    /// `None` means GET and POST are both allowed
    pub allowed_methods: Option<Vec<RequestMethod>>,

    /// `None` means no secret is required
    pub secret: Option<String>,

    /// Read the secret from this header instead of the body
    pub secret_header: Option<String>,
}

impl DeploymentConfig {
    /// Create an empty config rooted at `dir_name`
    pub fn new(dir_name: impl Into<PathBuf>) -> Self {
        let dir_name = dir_name.into();
        Self {
            run_dir: dir_name.clone(),
            dir_name,
            ..Default::default()
        }
    }

    /// Path of the config file
    pub fn config_path(&self) -> PathBuf {
        self.dir_name.join(&self.config_name)
    }

    /// Path of the lock file guarding executions of this deployment
    pub fn lock_path(&self) -> PathBuf {
        self.dir_name.join(format!("{}.lock", self.config_name))
    }

    /// Populate fields from a parsed config file
    pub fn apply(&mut self, file: DeploymentFile) {
        self.commands = file.commands;
        self.env = file.env;
        self.run_dir = match file.dir {
            Some(dir) => PathBuf::from(dir),
            None => self.dir_name.clone(),
        };
        self.log_file = file.log_to.map(PathBuf::from);
        self.secret = file.secret;
        self.secret_header = file.secret_header;
        self.allowed_methods = file
            .allowed_methods
            .map(|names| RequestMethod::from_names(&names));
    }
}
