//! Output location checks

use std::fs;
use std::path::Path;

use crate::domain::error::OutputPathError;

/// Create the output directory tree if needed
pub fn ensure_output_dir(outdir: &Path) -> Result<(), OutputPathError> {
    fs::create_dir_all(outdir).map_err(|e| OutputPathError::CreateDir {
        path: outdir.to_path_buf(),
        message: e.to_string(),
    })
}

/// Refuse to clobber an existing file unless overwriting is allowed
pub fn check_output_file(output: &Path, overwrite: bool) -> Result<(), OutputPathError> {
    if output.exists() && !overwrite {
        return Err(OutputPathError::AlreadyExists(output.to_path_buf()));
    }
    Ok(())
}
