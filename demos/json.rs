//! Converting between flowdoc text and JSON.
//!
//! Run with: cargo run --example json

use flowdoc::json::{flow_to_json, json_to_flow};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let text = "\
service = api
replicas = 3
ratio = 0.5
regions = [us, eu]
limits:
  cpu = 2.0
  memory = \"512 MiB\"
";

    let json = flow_to_json(text)?;
    println!("as JSON:\n{}\n", json);

    let back = json_to_flow(&json)?;
    println!("back to flowdoc:\n{}", back);
    assert_eq!(back, text);

    Ok(())
}
