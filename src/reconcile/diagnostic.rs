use std::fmt;

use crate::probe::DeadReason;

/// A per-address problem. Recorded and reported; never stops a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Probe failed or answered with a status other than 200/301/302.
    Invalid { address: String, reason: DeadReason },
    /// Redirect whose `Location` is not an absolute http(s) URL.
    InvalidRedirect {
        address: String,
        status: u16,
        location: String,
    },
    RedirectLimit {
        address: String,
        location: String,
        hops: usize,
    },
    /// The remote service rejected a create/enable/disable.
    MutationFailed {
        address: String,
        action: Action,
        error: String,
    },
    /// The remote service and the lookup table disagree on whether an entry
    /// exists for the address.
    Lookup { address: String, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Enable,
    Disable,
}

impl Action {
    pub fn for_flag(enabled: bool) -> Self {
        if enabled {
            Action::Enable
        } else {
            Action::Disable
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Enable => "enable",
            Action::Disable => "disable",
        })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Invalid { address, reason } => {
                write!(f, "!! Invalid ({}): {}", reason, address)
            }
            Diagnostic::InvalidRedirect {
                address,
                status,
                location,
            } => write!(f, "!! Invalid redirect ({}): {} -> {}", status, address, location),
            Diagnostic::RedirectLimit {
                address,
                location,
                hops,
            } => write!(
                f,
                "!! Redirect limit ({} hops): {} -> {}",
                hops, address, location
            ),
            Diagnostic::MutationFailed {
                address,
                action,
                error,
            } => write!(f, "!! Failed to {} ({}): {}", action, error, address),
            Diagnostic::Lookup { address, error } => {
                write!(f, "!! Lookup mismatch ({}): {}", error, address)
            }
        }
    }
}
