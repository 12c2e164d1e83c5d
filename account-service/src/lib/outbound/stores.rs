pub mod memory;
pub mod postgres;
mod tokens;

pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;
