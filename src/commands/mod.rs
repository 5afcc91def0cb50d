// Plugin protocol
pub mod serve;

// Operator tooling
pub mod check;
pub mod schema;
