//! `stockdash-auth`: the login gate in front of the dashboard.
//!
//! Decoupled from any form rendering or storage: a session lives only as long
//! as its [`SessionManager`].

pub mod session;

pub use session::{Credentials, Session, SessionManager};
