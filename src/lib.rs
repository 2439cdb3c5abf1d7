pub mod builder;
pub mod claim;
pub mod decoder;
pub mod did;
pub mod error;
pub mod token;
pub mod validator;

pub use claim::{Claim, JsonObject, REQUIRED_FIELDS};
pub use error::{DidTokenError, ErrorKind, StructureKind, ValidationKind};
pub use token::DidToken;
pub use validator::{ValidationParameters, DEFAULT_NBF_GRACE_PERIOD};
