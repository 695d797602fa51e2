use std::path::PathBuf;

/// Locates executables on `PATH`.
pub struct WhichUtil;

impl WhichUtil {
    /// Locate `command` on the system PATH.
    ///
    /// - If `require` is true and the command is not found, returns an error.
    /// - If `require` is false and the command is not found, returns `Ok(None)`.
    pub fn which(command: &str, require: bool) -> anyhow::Result<Option<PathBuf>> {
        if command.is_empty() {
            if require {
                anyhow::bail!("command must not be empty");
            }
            return Ok(None);
        }

        match which::which(command) {
            Ok(path) => {
                tracing::debug!("Located '{}' at '{}'", command, path.display());
                Ok(Some(path))
            }
            Err(_) if !require => Ok(None),
            Err(e) => anyhow::bail!(
                "{command}: command not found ({e}). Make sure '{command}' is installed and its location included in the 'PATH' environment variable."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sh() {
        let path = WhichUtil::which("sh", true).unwrap();
        assert!(path.is_some());
    }

    #[test]
    fn missing_optional_is_none() {
        let path = WhichUtil::which("definitely_not_a_command_xyz", false).unwrap();
        assert!(path.is_none());
    }

    #[test]
    fn missing_required_is_error() {
        let err = WhichUtil::which("definitely_not_a_command_xyz", true).unwrap_err();
        assert!(err.to_string().contains("command not found"));
    }

    #[test]
    fn empty_command() {
        assert!(WhichUtil::which("", true).is_err());
        assert!(WhichUtil::which("", false).unwrap().is_none());
    }
}
