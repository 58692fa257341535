pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{host_of, is_valid_url, normalize_url, verification_domain};
