//! Initialize identity command.

use std::path::PathBuf;

use starling_node::identity::NodeIdentity;

use crate::error::{CliError, CliResult};
use crate::output::{InitOutput, OutputFormat, Render};

pub fn init(data_dir: Option<PathBuf>, force: bool, format: OutputFormat) -> CliResult<String> {
    let data_dir = data_dir.unwrap_or_else(starling_node::default_data_dir);
    let identity_path = data_dir.join("identity.hex");

    if identity_path.exists() && !force {
        return Err(CliError::IdentityExists(identity_path.to_string_lossy().to_string()));
    }
    if identity_path.exists() && force {
        std::fs::remove_file(&identity_path)?;
    }

    let identity = NodeIdentity::load_or_generate(&identity_path)?;
    let output =
        InitOutput { peer_id: starling_crypto::peer_id_to_string(&identity.peer), identity_path: identity_path.to_string_lossy().to_string() };
    Ok(output.render(format))
}
