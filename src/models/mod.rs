pub mod place;
pub mod prompt;
pub mod requests;
pub mod responses;
