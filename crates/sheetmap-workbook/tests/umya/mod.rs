// Integration tests for the grid backend; run with `--features umya`.
#[path = "../support/common.rs"]
mod common;

mod read;
mod write;
