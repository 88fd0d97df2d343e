use anyhow::{bail, Context};
use rusty_hands::types::JOINT_NAMES;
use rusty_hands::GestureLibrary;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: inspect_library <stored.json> [image_reference]");
        return Ok(());
    }

    let library = GestureLibrary::load(&args[1]).context("Failed to load library")?;

    let Some(reference) = args.get(2) else {
        println!("{:<20} | {:<8} | References", "Name", "Examples");
        println!("{}", "-".repeat(60));
        for name in library.names() {
            let examples = library.examples(name);
            let refs: Vec<&str> = examples.iter().map(|e| e.image_reference.as_str()).collect();
            println!("{:<20} | {:<8} | {}", name, examples.len(), refs.join(", "));
        }
        return Ok(());
    };

    let Some((name, example)) = library.find_by_reference(reference) else {
        bail!("{} not found in {}", reference, args[1]);
    };

    println!("{} ({})", name, example.image_reference);
    for (joint, p) in JOINT_NAMES.iter().zip(example.pose.points()) {
        println!("{:<8} {:>9.3} {:>9.3} {:>9.3}", joint, p.x, p.y, p.z);
    }
    Ok(())
}
