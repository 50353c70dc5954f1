mod access;
mod authenticate;
mod client;
mod reconciled_tokens;

pub use access::enforce_access;
pub use authenticate::authenticate;
pub use client::ClientContext;
pub use reconciled_tokens::ReconciledTokens;
