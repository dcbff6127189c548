pub mod frame;
pub mod provider;
pub mod tracker;
