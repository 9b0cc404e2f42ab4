//! Subcommand handlers.
//!
//! Each handler returns a [`Report`]; `main` prints it as text or JSON.

pub mod round;
pub mod status;

use serde_json::Value;

/// Result of one subcommand.
pub struct Report {
    pub json: Value,
    pub text: String,
}

impl Report {
    pub fn print(&self, as_json: bool) -> anyhow::Result<()> {
        if as_json {
            println!("{}", serde_json::to_string_pretty(&self.json)?);
        } else {
            println!("{}", self.text);
        }
        Ok(())
    }
}
