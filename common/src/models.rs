pub mod credential;
pub mod result;
