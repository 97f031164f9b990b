pub mod fetch;
pub mod parser;
