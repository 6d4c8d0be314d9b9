//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create adaptest.toml
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    // Create example item pool
    std::fs::create_dir_all("item-pools")?;
    let pool_path = std::path::Path::new("item-pools/example.toml");
    if pool_path.exists() {
        println!("item-pools/example.toml already exists, skipping.");
    } else {
        std::fs::write(pool_path, EXAMPLE_POOL)?;
        println!("Created item-pools/example.toml");
    }

    // Create example frame script
    std::fs::create_dir_all("frame-scripts")?;
    let frames_path = std::path::Path::new("frame-scripts/example.toml");
    if frames_path.exists() {
        println!("frame-scripts/example.toml already exists, skipping.");
    } else {
        std::fs::write(frames_path, EXAMPLE_FRAMES)?;
        println!("Created frame-scripts/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: adaptest validate --pool item-pools/example.toml");
    println!("  2. Run: adaptest run --pool item-pools/example.toml --ability 0.7");
    println!("  3. Add --frames frame-scripts/example.toml to replay proctoring");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

monitor_interval_secs = 2
max_questions = 20
output_dir = "./adaptest-results"

# The static detector always sees one steady face; switch to a remote
# inference service for real proctoring.
[detector]
type = "static"

# [detector]
# type = "remote"
# base_url = "http://localhost:8500"
# api_key = "${ADAPTEST_DETECTOR_KEY}"
# min_confidence = 0.5
"#;

const EXAMPLE_POOL: &str = r#"[pool]
id = "example"
name = "Example Pool"
description = "A small mixed-difficulty pool to get started"
default_max_questions = 5

[[items]]
id = "ex-001"
text = "What is 7 x 8?"
kind = "multiple-choice"
options = ["54", "56", "63", "64"]
correct_option = 1
difficulty = 0.2
topic = "arithmetic"
points = 5

[[items]]
id = "ex-002"
text = "Is 91 a prime number?"
kind = "true-false"
options = ["true", "false"]
correct_option = 1
difficulty = 0.4
topic = "number-theory"
points = 5

[[items]]
id = "ex-003"
text = "Solve x^2 - 5x + 6 = 0"
kind = "multiple-choice"
options = ["x = 2, 3", "x = 1, 6", "x = -2, -3", "no real roots"]
correct_option = 0
difficulty = 0.5
topic = "quadratics"
points = 10

[[items]]
id = "ex-004"
text = "What is the derivative of x^3?"
kind = "multiple-choice"
options = ["3x^2", "x^2", "3x", "x^3/3"]
correct_option = 0
difficulty = 0.7
topic = "calculus"
points = 10

[[items]]
id = "ex-005"
text = "Explain why the sum of two odd numbers is always even."
kind = "essay"
difficulty = 0.9
topic = "proofs"
points = 15
"#;

const EXAMPLE_FRAMES: &str = r#"# One entry per analyzed frame; each face is [x0, y0, x1, y1].

# A steady face...
[[frames]]
faces = [[270.0, 140.0, 370.0, 280.0]]

[[frames]]
faces = [[272.0, 141.0, 372.0, 281.0]]

# ...then the face disappears for three frames (emits a no-face warning)
[[frames]]
faces = []

[[frames]]
faces = []

[[frames]]
faces = []

# ...and a second person leans in (emits a multiple-faces warning)
[[frames]]
faces = [[270.0, 140.0, 370.0, 280.0], [450.0, 120.0, 560.0, 270.0]]
"#;
