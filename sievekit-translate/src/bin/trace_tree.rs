/// Filter Tracer - Shows the flow through Simple → Tree → Simple, or Tree → Simple
///
/// Usage: cargo run --bin trace_tree <json-file> [version]
///
/// A JSON object is treated as a simple filter, a JSON array as a filter tree.
/// Set RUST_LOG=sievekit_translate=debug to see translator logging.

use serde_json::Value;
use sievekit_core::SieveConfig;
use sievekit_translate::SieveTranslator;
use std::fs;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_tree <json-file> [version]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_tree filter.json 2");
        std::process::exit(1);
    }

    let path = &args[1];
    let version = match args.get(2).map(|v| v.parse::<u8>()) {
        None => None,
        Some(Ok(v)) => Some(v),
        Some(Err(e)) => {
            eprintln!("❌ Invalid version {:?}: {}", args[2], e);
            std::process::exit(1);
        }
    };

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ SIEVE FILTER TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let input: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("❌ Failed to parse {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let translator = match SieveTranslator::new(SieveConfig::default()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if input.is_array() {
        trace_decompile(&translator, &input);
        return;
    }

    println!("📝 SIMPLE FILTER:");
    println!("{}", pretty(&input));
    println!();

    println!("🌳 FILTER TREE:");
    println!("─────────────────────────────────────────────────────────────");
    let version = version.map(sievekit_core::Version::try_from).transpose();
    let tree = match version.and_then(|v| translator.compile_value(&input, v)) {
        Ok(tree) => tree,
        Err(e) => {
            println!("❌ Compile error: {}", e);
            return;
        }
    };
    let tree = match serde_json::to_value(&tree) {
        Ok(v) => v,
        Err(e) => {
            println!("❌ Serialize error: {}", e);
            return;
        }
    };
    println!("{}", pretty(&tree));
    println!();

    println!("🔄 ROUND-TRIP TEST:");
    println!("─────────────────────────────────────────────────────────────");
    trace_decompile(&translator, &tree);
}

fn trace_decompile(translator: &SieveTranslator, tree: &Value) {
    match translator.decompile_value(tree) {
        Ok(simple) => {
            match serde_json::to_value(&simple) {
                Ok(v) => println!("{}", pretty(&v)),
                Err(e) => println!("❌ Serialize error: {}", e),
            }
            println!();
            println!("✅ Decompile succeeded!");
        }
        Err(e) => {
            println!("❌ {} ({})", e.message(), e.name());
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
