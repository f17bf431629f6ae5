use crate::cli::InitArgs;
use crate::init_template::EXAMPLE_CONFIG;

/// Write a commented example configuration file. Refuses to overwrite an
/// existing file.
pub async fn run(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("error: {} already exists, refusing to overwrite", args.output.display());
        return Ok(1);
    }

    std::fs::write(&args.output, EXAMPLE_CONFIG)?;
    println!("wrote example configuration to {}", args.output.display());

    Ok(0)
}
