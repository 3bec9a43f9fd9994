//! Storage adapters: Postgres for durable user records, Redis for sessions and the
//! registration-existence index.

pub mod registration_index;
pub mod session;
pub mod users;

pub use registration_index::RegistrationIndex;
pub use session::SessionStorage;
pub use users::UserStorage;
