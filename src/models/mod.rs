pub mod actor;
pub mod courier;
pub mod history;
pub mod order;
pub mod proof;
