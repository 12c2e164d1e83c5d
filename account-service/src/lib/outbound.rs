pub mod email;
pub mod events;
pub mod identity;
pub mod stores;
