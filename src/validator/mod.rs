pub mod accessor;
pub mod token_validator;

pub use accessor::{get_validator, init_validator, validate_token, ValidatorCell};
pub use token_validator::TokenValidator;
