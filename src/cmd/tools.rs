use crate::error::AppResult;
use crate::tools::definitions;

pub fn run() -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(&definitions())?);
    Ok(())
}
