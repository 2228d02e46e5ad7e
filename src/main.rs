use dotenvy::dotenv;
use ptrab_inteligente::{
    config::database::{create_connection, create_tables},
    core::report::{generate_ptrab_report, render_report},
    errors::{Error, Result},
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn parse_ptrab_id(args: &[String]) -> Result<i64> {
    let raw = args.get(1).ok_or_else(|| Error::Config {
        message: "usage: ptrab-report <ptrab_id>".to_string(),
    })?;

    raw.trim().parse().map_err(|e| Error::Config {
        message: format!("Invalid P Trab id '{raw}': {e}"),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let ptrab_id = parse_ptrab_id(&args).inspect_err(|e| error!("{e}"))?;

    // 3. Initialize database
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 4. Build and print the report
    let report = generate_ptrab_report(&db, ptrab_id)
        .await
        .inspect_err(|e| error!("Failed to generate report: {e}"))?;
    println!("{}", render_report(&report));

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_ptrab_id() {
        assert_eq!(parse_ptrab_id(&args(&["ptrab-report", "7"])).unwrap(), 7);
        assert!(parse_ptrab_id(&args(&["ptrab-report"])).is_err());
        assert!(parse_ptrab_id(&args(&["ptrab-report", "sete"])).is_err());
    }
}
