pub mod activity;
pub mod auth;
pub mod footprint;

#[cfg(test)]
pub(crate) mod test_support;
