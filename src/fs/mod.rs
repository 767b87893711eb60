//! Filesystem model: nodes, scanning, the flattened index and the tree façade.

pub mod index;
pub mod node;
pub mod operations;
pub mod order;
pub mod registry;
pub mod scan;
pub mod trash;
pub mod tree;
