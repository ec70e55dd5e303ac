//! Resolution policy configuration
//!
//! Policies are plain TOML documents loaded from an explicitly supplied
//! path and threaded into every engine call. There is no ambient/global
//! policy: multi-tenant callers hold one policy value per tenant and tests
//! construct policies inline.
//!
//! ```toml
//! strategy = "hybrid"
//! min_confidence_threshold = 0.25
//! prefer_recent = true
//!
//! [[sources]]
//! key = "manual"
//! priority = 1
//!
//! [[sources]]
//! key = "provider-a"
//! priority = 2
//! [sources.field_priorities]
//! cover_date = 1
//!
//! [forced_sources]
//! publisher = "provider-b"
//!
//! [auto_apply]
//! enabled = true
//! on_import = true
//! on_update = false
//! ```

use std::path::Path;
use tracing::info;

use crate::error::{ResolutionError, Result};
use crate::types::ResolutionPolicy;

/// Load and validate a resolution policy from a TOML file
///
/// # Errors
/// `Io` when the file cannot be read, `Config` when it does not parse,
/// `Policy` when it parses but violates policy invariants.
pub fn load_policy(path: &Path) -> Result<ResolutionPolicy> {
    let content = std::fs::read_to_string(path)?;
    let policy = parse_policy(&content)?;
    info!(path = %path.display(), "resolution policy loaded");
    Ok(policy)
}

/// Parse and validate a resolution policy from TOML text
pub fn parse_policy(content: &str) -> Result<ResolutionPolicy> {
    let policy: ResolutionPolicy = toml::from_str(content)
        .map_err(|e| ResolutionError::Config(format!("Parse policy TOML failed: {e}")))?;
    policy.validate()?;
    Ok(policy)
}
