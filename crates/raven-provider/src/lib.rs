//! Remote profile fetch collaborator.

pub mod error;
pub mod profile_client;
pub mod profile_payload;

pub use error::FetchError;
pub use profile_client::{
    profile_page_url, ProfileClient, ProfileSource, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_WEB_BASE,
};
pub use profile_payload::FetchedProfile;
