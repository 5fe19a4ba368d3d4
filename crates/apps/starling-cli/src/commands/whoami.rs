//! Show identity command.

use std::path::PathBuf;

use starling_node::identity::NodeIdentity;

use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, Render, WhoamiOutput};

pub fn whoami(data_dir: Option<PathBuf>, routing_address: String, format: OutputFormat) -> CliResult<String> {
    let data_dir = data_dir.unwrap_or_else(starling_node::default_data_dir);
    let identity_path = data_dir.join("identity.hex");

    if !identity_path.exists() {
        return Err(CliError::user("no identity found; run 'starling init' first"));
    }

    let identity = NodeIdentity::load_or_generate(&identity_path)?;
    let output = WhoamiOutput { peer_id: starling_crypto::peer_id_to_string(&identity.peer), routing_address };
    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn whoami_without_an_identity_is_a_user_error() {
        let dir = TempDir::new().unwrap();
        let result = whoami(Some(dir.path().to_path_buf()), "g.alice".to_string(), OutputFormat::Human);
        assert!(matches!(result, Err(CliError::User(_))));
    }

    #[test]
    fn whoami_reports_the_same_peer_id_init_created() {
        let dir = TempDir::new().unwrap();
        let identity_path = dir.path().join("identity.hex");
        let identity = NodeIdentity::load_or_generate(&identity_path).unwrap();
        let expected = starling_crypto::peer_id_to_string(&identity.peer);

        let output = whoami(Some(dir.path().to_path_buf()), "g.alice".to_string(), OutputFormat::Json).unwrap();
        assert!(output.contains(&expected));
    }
}
