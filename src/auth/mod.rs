mod password;

pub use password::{CredentialHasher, generate_password, hash_account_password};
