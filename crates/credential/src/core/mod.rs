mod error;
mod secure;
mod token;

pub use error::{ConfigError, CredentialError};
pub use secure::SecureString;
pub use token::AccessToken;
