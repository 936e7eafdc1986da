use std::env;
use std::io;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use weft_core::Namespace;
use weft_generate::{GenerateOptions, GenerationEngine, JsonSink, deliver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let mut namespace_dir: Option<PathBuf> = None;
    let mut options = GenerateOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--size" => options.size = args.next().ok_or("missing --size value")?.parse()?,
            "--seed" => options.seed = Some(args.next().ok_or("missing --seed value")?.parse()?),
            _ => {
                if namespace_dir.is_none() {
                    namespace_dir = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let namespace_dir = namespace_dir.ok_or("missing namespace directory")?;
    let namespace = Namespace::from_dir(&namespace_dir)?;

    let engine = GenerationEngine::new(options);
    let result = engine.run(&namespace)?;

    let mut sink = JsonSink::new(io::stdout().lock(), true);
    deliver(&result, &mut sink)?;
    eprintln!("seed={} rows={}", result.report.seed, result.report.rows_total);
    Ok(())
}
