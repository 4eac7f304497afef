pub mod converter;
pub mod pipeline;
pub mod rewrite;
pub mod workspace;
