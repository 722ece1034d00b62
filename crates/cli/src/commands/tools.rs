//! `incant tools`: List the built-in tools.

use incant_tools::default_registry;

pub fn run() {
    let registry = default_registry();

    println!();
    println!("  Available tools ({}):", registry.len());
    println!();
    for name in registry.names() {
        if let Some(tool) = registry.lookup(name) {
            let marker = if tool.return_direct() { " [direct]" } else { "" };
            println!("  {name}{marker}");
            println!("      {}", tool.description());
        }
    }
    println!();
}
