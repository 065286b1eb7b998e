//! Config Linter — validates a prompt tree and flags degenerate nodes.
//!
//! Usage: config_linter <tree.ron>

use prompt_weaver::schema::node::{ConfigNode, ContentType, SelectionMode};
use prompt_weaver::schema::tree::NodePath;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: config_linter <tree.ron>");
        process::exit(0);
    }

    let tree = match ConfigNode::load_from_ron(Path::new(&args[1])) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("ERROR: Failed to load tree: {}", e);
            process::exit(1);
        }
    };

    let (errors, warnings) = lint_tree(&tree);

    println!("\n=== Prompt Tree Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
}

fn lint_tree(root: &ConfigNode) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    lint_node(root, &NodePath::root(), true, &mut errors, &mut warnings);

    (errors, warnings)
}

/// `validated` is false below a string node: those children are not
/// validated on commit, so their problems are only warnings.
fn lint_node(
    node: &ConfigNode,
    path: &NodePath,
    validated: bool,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let label = format!("'{}' at {}", node.name, path);

    for e in node.field_errors() {
        if validated {
            errors.push(format!("Node {}: {}", label, e));
        } else {
            warnings.push(format!("Node {} (in an ignored pool): {}", label, e));
        }
    }

    if !node.enabled {
        warnings.push(format!("Node {} is disabled and will never contribute", label));
    }

    let pool_size = node.pool_size();
    if pool_size == 0 && node.enabled {
        warnings.push(format!("Node {} has an empty candidate pool", label));
    }

    match node.content_type {
        ContentType::String if !node.nested_configs.is_empty() => warnings.push(format!(
            "Node {} is a string node; its {} nested configs are ignored",
            label,
            node.nested_configs.len()
        )),
        ContentType::Nested if !node.string_contents.is_empty() => warnings.push(format!(
            "Node {} is a nested node; its {} fragments are ignored",
            label,
            node.string_contents.len()
        )),
        _ => {}
    }

    if node.selection_mode == SelectionMode::MultipleCount
        && pool_size > 0
        && node.select_count as usize > pool_size
    {
        warnings.push(format!(
            "Node {} selects {} of only {} candidates; all will be used",
            label, node.select_count, pool_size
        ));
    }

    if node.content_type == ContentType::String {
        let mut seen = FxHashSet::default();
        for fragment in node.active_fragments() {
            if !seen.insert(fragment) {
                warnings.push(format!("Node {} repeats fragment '{}'", label, fragment));
            }
        }
    }

    // Children of an ignored pool are still linted; they may be switched on later
    let children_validated = validated && node.content_type == ContentType::Nested;
    for (index, child) in node.nested_configs.iter().enumerate() {
        lint_node(child, &path.child(index), children_validated, errors, warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompt_weaver::schema::node::NodeOverrides;

    #[test]
    fn reports_every_error_on_a_node() {
        let mut bad = ConfigNode::create("");
        bad.select_count = 0;
        bad.bracket_min = 9;
        let root = ConfigNode::group("root", vec![ConfigNode::leaf("ok", &["a"]), bad]);

        let (errors, _) = lint_tree(&root);
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(errors.iter().all(|e| e.contains("at /1")));
        assert!(errors.iter().any(|e| e.contains("must not be empty")));
        assert!(errors.iter().any(|e| e.contains("select count 0")));
        assert!(errors.iter().any(|e| e.contains("bracket depth 9")));
    }

    #[test]
    fn errors_collected_across_nodes() {
        let mut first = ConfigNode::leaf("first", &["a"]);
        first.select_probability = 0.0;
        let second = ConfigNode::leaf("", &["b"]);
        let root = ConfigNode::group("root", vec![first, second]);

        let (errors, _) = lint_tree(&root);
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }

    #[test]
    fn ignored_pool_problems_are_warnings() {
        let root = ConfigNode::group("root", vec![ConfigNode::create("")])
            .copy_with(NodeOverrides::new().content_type(ContentType::String));
        let (errors, warnings) = lint_tree(&root);
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.iter().any(|w| w.contains("ignored pool")));
    }

    #[test]
    fn disabled_empty_node_warns_once() {
        let disabled = ConfigNode::create("off").copy_with(NodeOverrides::new().enabled(false));
        let root = ConfigNode::group("root", vec![disabled, ConfigNode::leaf("on", &["a"])]);

        let (errors, warnings) = lint_tree(&root);
        assert!(errors.is_empty());
        let about_off: Vec<&String> = warnings.iter().filter(|w| w.contains("'off'")).collect();
        assert_eq!(about_off.len(), 1, "{:?}", about_off);
        assert!(about_off[0].contains("disabled"));
    }

    #[test]
    fn enabled_empty_node_still_warns() {
        let root = ConfigNode::group("root", vec![ConfigNode::create("empty")]);
        let (_, warnings) = lint_tree(&root);
        assert!(warnings.iter().any(|w| w.contains("'empty'") && w.contains("empty candidate pool")));
    }
}
