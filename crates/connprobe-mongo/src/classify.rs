use mongodb::error::{Error, ErrorKind};

use connprobe_core::error::{Diagnosis, ProbeError};

/// Category of a driver error. Checked in priority order: connectivity,
/// configuration, authentication, then anything else.
pub fn diagnose(err: &Error) -> Diagnosis {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => Diagnosis::Connectivity,
        ErrorKind::InvalidArgument { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::InvalidTlsConfig { .. } => Diagnosis::Configuration,
        ErrorKind::Authentication { .. } | ErrorKind::Command(_) | ErrorKind::Write(_) => {
            Diagnosis::Authentication
        }
        _ => Diagnosis::Unexpected,
    }
}

pub fn classify(err: Error) -> ProbeError {
    let diagnosis = diagnose(&err);
    let source = anyhow::Error::new(err);
    match diagnosis {
        Diagnosis::Connectivity => ProbeError::ConnectivityFailure(source),
        Diagnosis::Configuration => ProbeError::ConfigurationInvalid(source),
        Diagnosis::Authentication => ProbeError::AuthenticationFailure(source),
        _ => ProbeError::UnexpectedFailure(source),
    }
}
