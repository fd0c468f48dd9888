#[path = "../utils/mod.rs"]
mod utils;

mod coordinator_tests;
