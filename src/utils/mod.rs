pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{
    extract_domain, normalize_url, resolve_link, storage_path_for,
};
