mod hosted;

pub use hosted::{classify_provider_error, HostedLlm};
