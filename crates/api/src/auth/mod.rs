//! Authentication primitives.
//!
//! Tokens are issued by the login service, which shares `JWT_SECRET` with
//! this API. The API only validates them; [`jwt::generate_access_token`]
//! exists for that service and for tests.

pub mod jwt;
