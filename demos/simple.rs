//! Parsing and writing flowdoc text.
//!
//! Run with: cargo run --example simple

use flowdoc::{flow, from_str, from_value, to_string, to_value, Value};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Channel {
    name: String,
    gain: f64,
    enabled: bool,
    ranges: Vec<i64>,
}

const CONFIG: &str = "\
# bench setup
station = \"Lab 3\"
retries = 3
channels:
  a:
    name = probe
    gain = 2.5
    enabled = true
    ranges = [1, 10, 100]
  b:
    name = \"spare probe\"
    gain = 1.0
    enabled = false
    ranges = []
";

fn main() -> Result<(), Box<dyn Error>> {
    let value = from_str(CONFIG);

    if let Some(Value::String(station)) = value.get("station") {
        println!("station: {}", station);
    }
    let retries = value.get("retries").and_then(Value::as_i64).unwrap_or(0);
    println!("retries: {}", retries);

    // Typed access to one subtree
    if let Some(a) = value.get("channels").and_then(|c| c.get("a")) {
        let channel: Channel = from_value(a.clone())?;
        println!("channel a: {:?}", channel);
    }

    // Build a tree and write it back out
    let extra = to_value(&Channel {
        name: "scope input".to_string(),
        gain: 4.0,
        enabled: true,
        ranges: vec![5, 50],
    })?;
    let mut doc = flow!({ "station": "Lab 4", "retries": 1 });
    if let Value::Object(root) = &mut doc {
        root.insert("extra".to_string(), extra);
    }

    let text = to_string(&doc)?;
    println!("\nwritten:\n{}", text);
    assert_eq!(to_string(&from_str(&text))?, text);
    println!("✓ Round-trip successful");

    Ok(())
}
