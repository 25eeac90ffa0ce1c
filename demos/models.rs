//! Alias resolution and typed coercion with mapping models.
//!
//! Run with: cargo run --example models

use flowdoc::{
    from_str_with_model, to_string, FieldDefinition, FieldType, ModelDefinition, ModelRegistry,
};
use std::error::Error;

const EMBEDDED: &str = "\
$models:
  Instrument:
    fields:
      id:
        alias = i
      calibrated:
        alias = c
        type = date
      price:
        alias = p
        type = float
use_model = Instrument
scope:
  i = INS-0001
  c = 2025-01-31
  p = 1200
broken:
  i = INS-0002
  c = 2025-13-40
";

fn main() -> Result<(), Box<dyn Error>> {
    // The document carries its own model
    let value = from_str_with_model(EMBEDDED, None)?;
    println!("embedded model:\n{}", to_string(&value)?);

    // A registry built in code takes precedence over `$models`
    let mut model = ModelDefinition::new("Reading");
    model.add_field(FieldDefinition::new("temperature", "t").with_type(FieldType::Float));
    model.add_field(FieldDefinition::new("samples", "n").with_type(FieldType::Int));
    let mut registry = ModelRegistry::new();
    registry.register(model);

    let text = "use_model = Reading\nnow:\n  t = 21\n  n = \"64\"\n";
    let value = from_str_with_model(text, Some(&registry))?;
    println!("registry model:\n{}", to_string(&value)?);

    if let Err(err) = from_str_with_model("use_model = Missing\n", Some(&registry)) {
        println!("expected failure: {}", err);
    }

    Ok(())
}
