pub mod search;
pub mod status;
