//! The MessagePack envelope, with and without field ids.
//!
//! Run with: cargo run --example binary

use flowdoc::mapping::extract_models;
use flowdoc::{binary, from_str, from_str_with_model, BinaryOptions};
use std::error::Error;

const DOC: &str = "\
$models:
  Point:
    fields:
      latitude:
        alias = lat
        type = float
        id = 1
      longitude:
        alias = lon
        type = float
        id = 2
use_model = Point
london:
  lat = 51.5072
  lon = -0.1276
paris:
  lat = 48.8566
  lon = 2.3522
";

fn main() -> Result<(), Box<dyn Error>> {
    let value = from_str_with_model(DOC, None)?;
    let registry = extract_models(&from_str(DOC)).ok_or("document has no models")?;
    let model = registry.get("Point").ok_or("model not found")?;

    let plain = binary::to_vec(&value)?;
    let compact =
        binary::to_vec_with_model(&value, model, &BinaryOptions::new().with_field_ids(true))?;
    println!("plain envelope:    {} bytes", plain.len());
    println!("field-id envelope: {} bytes", compact.len());

    let decoded = binary::from_slice_with_model(&compact, model)?;
    assert_eq!(decoded, value);
    println!("✓ Decoded field ids back to full names");

    Ok(())
}
