//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(pool_path: PathBuf) -> Result<()> {
    let pools = if pool_path.is_dir() {
        adaptest_core::parser::load_pool_directory(&pool_path)?
    } else {
        vec![adaptest_core::parser::parse_pool(&pool_path)?]
    };

    let mut total_warnings = 0;

    for pool in &pools {
        println!("Pool: {} ({} items)", pool.name, pool.items.len());

        let warnings = adaptest_core::parser::validate_pool(pool);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All pools valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
