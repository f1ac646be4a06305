pub mod canonicalizer;
pub mod editorial;
