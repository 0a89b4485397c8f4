pub mod config;
pub mod history;
pub mod plan;
pub mod run;
pub mod subscription;

use uuid::Uuid;

/// Parse a plan or record id given on the command line.
pub fn parse_id(raw: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    Uuid::parse_str(raw).map_err(|e| format!("invalid id '{raw}': {e}").into())
}
