use std::fmt;

/// The three places a single package version can live on the local disk.
///
/// * `Production` holds packages that were published to, or downloaded from, a repository. Once
///   written they are never modified.
/// * `Local` holds drafts published only on this machine. They shadow `Production` and may be
///   rewritten.
/// * `Tmp` is scratch space for builds and transfers. Nothing in it is ever trusted.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Environment {
    Production,
    Local,
    Tmp,
}

impl Environment {
    /// The name of the directory, under a group directory, that holds this environment.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Environment::Production => ".artifacts",
            Environment::Local => ".local-artifacts",
            Environment::Tmp => ".tmp-artifacts",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Production => "production",
            Environment::Local => "local",
            Environment::Tmp => "tmp",
        };
        f.write_str(name)
    }
}
