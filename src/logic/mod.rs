//! Pure cryptographic logic used by the software secure element

pub mod ecies;
