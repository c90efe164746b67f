// file: src/source/mod.rs
// description: file discovery module exports
// reference: internal module structure

pub mod scanner;

pub use scanner::FileScanner;
