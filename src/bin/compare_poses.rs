use anyhow::Context;
use rusty_hands::{closeness, normalize, Pose};
use std::fs;

fn read_pose(path: &str) -> anyhow::Result<Pose> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let pose: Pose = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a 21x3 pose", path))?;
    Ok(pose)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: compare_poses <pose_a.json> <pose_b.json>");
        return Ok(());
    }

    let a = normalize(&read_pose(&args[1])?)?;
    let b = normalize(&read_pose(&args[2])?)?;

    let result = closeness(&a, &b);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
