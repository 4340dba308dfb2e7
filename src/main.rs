//! Contract intake server binary
//!
//! Serves the program & contract data entry form.

use std::time::Duration;

use clap::Parser;
use contract_intake::api::{run_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "contract-intake")]
#[command(version)]
#[command(about = "Program & contract data entry form that builds an Excel workbook")]
#[command(long_about = r#"
Contract Intake - Program & Contract Data Entry Form

Serves a web form whose rows are appended to the "dataIn" sheet of an
in-memory Excel workbook. Nothing is stored on the server: upload an
existing workbook (optional), add rows, then download MainData.xlsx.
Sessions idle for longer than --session-ttl are discarded.

Endpoints:
  - GET    /                 - Entry form with preview of the last rows
  - POST   /rows             - Add a row (form submission)
  - POST   /upload           - Start a session from an .xlsx body
  - GET    /download         - Download the current workbook
  - POST   /api/v1/rows      - Add a row (JSON)
  - GET    /api/v1/preview   - Trailing rows (JSON)
  - DELETE /api/v1/session   - End the current session
  - GET    /health, /version

Example usage:
  contract-intake                           # Start on localhost:8080
  contract-intake --host 0.0.0.0 --port 3000
  contract-intake --session-ttl 600         # Drop sessions idle for 10 minutes
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "INTAKE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "INTAKE_PORT")]
    port: u16,

    /// Number of trailing rows shown in the preview
    #[arg(long, default_value = "10", env = "INTAKE_PREVIEW_ROWS")]
    preview_rows: usize,

    /// Seconds a session may sit idle before its workbook is discarded
    #[arg(
        long,
        default_value = "1800",
        env = "INTAKE_SESSION_TTL",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    session_ttl: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        preview_rows: args.preview_rows,
        session_ttl: Duration::from_secs(args.session_ttl),
    };

    run_server(config).await
}
