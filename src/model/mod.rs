pub mod json;
pub mod node;
pub mod schema;
