pub mod header;
pub mod store;

pub use header::{parse_authorization, Credentials};
pub use store::{CredentialEntry, CredentialStore};
