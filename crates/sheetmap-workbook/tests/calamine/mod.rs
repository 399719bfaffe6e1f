// Integration tests for the range backend; run with `--features calamine`.
#[path = "../support/common.rs"]
mod common;

mod read;
mod write;
