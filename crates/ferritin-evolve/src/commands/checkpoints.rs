use ferritin_evolve::checkpoints::{checkpoints, DEFAULT_CHECKPOINT};
use ferritin_evolve::store::onnx::onnx_repo;

pub fn execute() -> anyhow::Result<()> {
    for (key, identifier) in checkpoints() {
        let mut notes = Vec::new();
        if key == DEFAULT_CHECKPOINT {
            notes.push("default");
        }
        if onnx_repo(identifier).is_none() {
            notes.push("no ONNX export");
        }
        if notes.is_empty() {
            println!("{key:<10} {identifier}");
        } else {
            println!("{key:<10} {identifier} ({})", notes.join(", "));
        }
    }
    Ok(())
}
