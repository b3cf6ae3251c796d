pub mod admin;
pub mod beat;
pub mod error;
pub mod jobs;
pub mod query;

#[cfg(test)]
mod tests;
