use backend::config::Config;
use backend::store::ContentStore;
use std::env;
use std::path::PathBuf;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} verify [content_dir]", program);
    eprintln!("       {} repair <group> [content_dir]", program);
    eprintln!("       (content_dir defaults to CONTENT_DIR, then ./content)");
    std::process::exit(2);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("hub-index");
    let config = Config::from_env();
    let content_dir = |idx: usize| {
        args.get(idx)
            .map(PathBuf::from)
            .unwrap_or_else(|| config.content_dir.clone())
    };

    match args.get(1).map(String::as_str) {
        Some("verify") => {
            let store = ContentStore::new(content_dir(2), config.default_group.clone());
            let reports = store.verify_all()?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
            if reports.iter().any(|r| !r.is_clean()) {
                eprintln!("Index drift detected. Run `{} repair <group>` to rebuild.", program);
                std::process::exit(1);
            }
        }
        Some("repair") => {
            let Some(group) = args.get(2) else { usage(program) };
            let store = ContentStore::new(content_dir(3), config.default_group.clone());
            let report = store.repair_group(group)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_clean() {
                eprintln!("Group {} was already consistent.", group);
            } else {
                eprintln!("Group {} repaired.", group);
            }
        }
        _ => usage(program),
    }

    Ok(())
}
