/// User records and the store they live in
///
/// The store is an external collaborator; this crate only reads records and
/// asks the store to create them.

mod model;
mod postgres;
mod store;

pub use model::{Credentials, PublicUser, UserRecord};
pub use postgres::PgUserStore;
pub use store::{InMemoryUserStore, UserStore};
