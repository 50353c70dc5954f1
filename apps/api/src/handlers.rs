pub mod health;
pub mod mfa;
pub mod roles;
pub mod session;
pub mod users;
