use std::path::PathBuf;

/// Clap value parser for AWS config/credentials file options.
pub fn check_aws_file_exists(file_path: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(file_path);

    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("AWS file not found: {}", path.display()))
    }
}
