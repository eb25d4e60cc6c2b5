//! Example: Inspect an FCStd document.
//!
//! Run with: cargo run --example inspect_fcstd -- path/to/part.FCStd
//!
//! No tessellator ships with this crate, so shapes are listed but not
//! meshed; image planes are decoded.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use lens_core::fcstd::{
    apply_presentation, eligible, Container, DecodedShape, FcstdImporter, GeometryKernel,
    ImportOptions, KernelError, MetadataParser,
};

/// Kernel stand-in that reports every shape as undecodable.
struct NoKernel;

impl GeometryKernel for NoKernel {
    fn initialize(&self) -> Result<(), KernelError> {
        Ok(())
    }

    fn decode_brep(&self, _bytes: &[u8]) -> DecodedShape {
        DecodedShape::failure()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: inspect_fcstd <path-to-fcstd-file> [options.json]");
        println!("\nExample:");
        println!("  cargo run --example inspect_fcstd -- assets/bracket.FCStd");
        return Ok(());
    }

    let path = &args[1];
    let options = match args.get(2) {
        Some(options_path) => {
            let json = std::fs::read_to_string(options_path)
                .with_context(|| format!("Failed to read options {options_path}"))?;
            ImportOptions::from_json_str(&json).context("Invalid options file")?
        }
        None => ImportOptions::default(),
    }
    .with_join_images(true);

    println!("Loading FCStd file: {}", path);
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;

    let container = Container::from_bytes(&bytes)?;
    println!("\n=== Container: {} entries ===", container.len());
    for name in container.names() {
        println!("  {}", name);
    }

    let mut document = MetadataParser::new(&container, &options.naming_schemes).parse()?;
    apply_presentation(&container, &mut document.registry);

    println!("\n--- Document Properties ---");
    println!("{}", serde_json::to_string_pretty(&document.properties)?);

    println!("\n--- Objects ---");
    let registry = &document.registry;
    for (id, record) in registry.iter() {
        println!(
            "  [{}] {} ({}) label={:?} visible={} links={} file={:?} eligible={}",
            id.0,
            record.name,
            record.type_name,
            record.label,
            record.visible,
            record.inbound_links,
            record.file.file_name(),
            eligible(record, registry)
        );
        if let Some(parent) = registry.parent_of(record) {
            println!("       Parent: {}", parent.name);
        }
    }

    if !document.linked_files.is_empty() {
        println!("\n--- Linked Files ---");
        for (object, file) in &document.linked_files {
            println!("  {} -> {}", object, file);
        }
    }

    let importer = FcstdImporter::new(Arc::new(NoKernel), options);
    let report = importer.import_container(&bytes)?;

    println!("\n=== Import: {:?} ===", report.status);
    for node in &report.model.nodes {
        println!(
            "  {} [{:?}] {} children, {} triangles",
            node.display_name(),
            node.kind,
            node.children.len(),
            node.triangle_count()
        );
    }
    for diagnostic in &report.diagnostics {
        println!("  ! {:?}", diagnostic);
    }

    Ok(())
}
