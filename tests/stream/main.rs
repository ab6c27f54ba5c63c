#[path = "../support/mod.rs"]
mod support;

mod spot_stream;
