use pulseline_plugins::builtin_registry;

/// Execute the `plugins` command: list every registered plugin by
/// capability family.
pub fn execute() {
    let deps = super::standalone_deps(None);
    let registry = builtin_registry(&deps);

    println!("Available plugins:");
    for family in registry.families() {
        for name in registry.names(&family) {
            println!("  {family}/{name}");
        }
    }
}
