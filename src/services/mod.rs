pub mod messages;
pub mod remote;

#[cfg(test)]
pub(crate) mod stub;
