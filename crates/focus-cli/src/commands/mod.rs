pub mod focus;
pub mod version;
pub mod workspaces;

use serde::Serialize;

/// Error shape shared by every JSON result.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
}

impl From<&focus_core::Error> for ErrorInfo {
    fn from(err: &focus_core::Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Report a failed command and exit with status 2.
pub fn fail(err: &focus_core::Error, json: bool) -> ! {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": false,
                "error": ErrorInfo::from(err),
            })
        );
    } else {
        eprintln!("error: {}: {}", err.code(), err);
    }
    std::process::exit(2);
}
