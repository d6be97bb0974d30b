pub mod adapters;
pub mod build;
pub mod build_tree;
pub mod cli;
pub mod collector;
pub mod error;
pub mod locate;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod report;
pub mod settings;
