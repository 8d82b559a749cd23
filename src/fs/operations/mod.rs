//! Filesystem operations split into focused modules.

mod browse;
mod dir_ops;
mod transfer;
mod tree;
