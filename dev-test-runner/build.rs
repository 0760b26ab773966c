//! Generate the IR node families from `../schema/ir.json` into `OUT_DIR`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = std::path::PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);
    let schema_path = manifest_dir.join("../schema/ir.json");
    println!("cargo:rerun-if-changed={}", schema_path.display());

    let schema = nodegen::load_schema(&[&schema_path])?;
    let artifacts = nodegen::generate(&schema, &nodegen::GenOptions::default());
    nodegen::write_artifacts(&out_dir, &artifacts)?;
    Ok(())
}
