use anyhow::Result;

/// Print the OpenAPI document to stdout.
fn main() -> Result<()> {
    let spec = enirejo::api::openapi();

    println!("{}", spec.to_pretty_json()?);

    Ok(())
}
