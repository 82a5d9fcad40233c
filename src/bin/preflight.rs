use course_tree_engine::infra::config;
use course_tree_engine::PostgresContentStore;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--apply-schema]\n\
         \n\
         Requires env vars:\n\
           DATABASE_URL\n\
         Optional:\n\
           DB_MAX_CONNECTIONS, BUILD_CONCURRENCY, PATTERN_CATALOG_PATH, BIND_ADDR\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let apply_schema = args.iter().any(|a| a == "--apply-schema");

    // Force-read config (nice error messages if missing)
    let database_url = config::database_url()?;
    let max_connections = config::db_max_connections()?;
    let concurrency = config::build_concurrency()?;

    println!("> Preflight:");
    println!("  BIND_ADDR={}", config::bind_addr());
    println!("  DB_MAX_CONNECTIONS={}", max_connections);
    println!("  BUILD_CONCURRENCY={}", concurrency);

    let catalog = config::pattern_catalog()?;
    match config::pattern_catalog_path() {
        Some(path) => println!("  Pattern catalog: {} (v{}, valid)", path.display(), catalog.version),
        None => println!("  Pattern catalog: built-in (v{})", catalog.version),
    }
    for (page_type, pattern) in catalog.patterns() {
        let names: Vec<&str> = pattern.iter().map(|t| t.as_str()).collect();
        println!("    {:<12} {}", page_type.as_str(), names.join(","));
    }

    let store = PostgresContentStore::connect(&database_url, max_connections).await?;
    sqlx::query("SELECT 1").execute(store.pool()).await?;
    println!("  Database reachable.");

    if apply_schema {
        store.ensure_schema().await?;
        println!("  Schema applied.");
    }

    let missing = store.missing_tables().await?;
    if missing.is_empty() {
        println!("  All content tables present.");
    } else {
        eprintln!(
            "  Warning: missing tables: {} (run with --apply-schema, or start api_server once).",
            missing.join(", ")
        );
    }

    println!("> Preflight OK.");
    Ok(())
}
