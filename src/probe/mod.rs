pub mod http_probe;

use std::fmt;

use async_trait::async_trait;

pub use http_probe::HttpProbe;

/// Outcome of probing one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    /// The address itself answered 200.
    Live,
    /// 301/302 with a `Location` header. The location is reported verbatim and
    /// may be relative.
    Redirect { location: String, status: u16 },
    Dead(DeadReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadReason {
    Status(u16),
    Error(String),
}

impl fmt::Display for DeadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadReason::Status(code) => write!(f, "{}", code),
            DeadReason::Error(msg) => f.write_str(msg),
        }
    }
}

/// One header-only request per call. Implementations must not follow
/// redirects; the reconciler chases them itself.
#[async_trait]
pub trait LivenessProbe {
    async fn check(&self, url: &str) -> Liveness;
}
