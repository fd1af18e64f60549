//! Backend that shells out to the `age` command.

use crate::backend::Crypto;
use crate::error::{Error, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Runs `age --decrypt` / `age --encrypt`.
#[derive(Debug, Clone)]
pub struct AgeBackend {
    program: String,
}

impl AgeBackend {
    /// Use `age` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("age")
    }

    /// Use a specific executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&std::ffi::OsStr]) -> Result<Output> {
        log::debug!("running {} {:?}", self.program, args);
        Command::new(&self.program).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::AgeNotFound
            } else {
                Error::Crypto {
                    operation: "age",
                    path: Path::new(&self.program).to_path_buf(),
                    message: e.to_string(),
                }
            }
        })
    }
}

impl Default for AgeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Crypto for AgeBackend {
    fn is_available(&self) -> bool {
        self.run(&["--version".as_ref()]).is_ok()
    }

    fn decrypt(&self, ciphertext: &Path, identity: &Path) -> Result<Vec<u8>> {
        let output = self.run(&[
            "--decrypt".as_ref(),
            "-i".as_ref(),
            identity.as_os_str(),
            ciphertext.as_os_str(),
        ])?;

        if !output.status.success() {
            return Err(failure("decryption", ciphertext, &output));
        }

        Ok(output.stdout)
    }

    fn encrypt(&self, plaintext: &Path, output: &Path, recipients: &[String]) -> Result<()> {
        if recipients.is_empty() {
            return Err(Error::Crypto {
                operation: "encryption",
                path: plaintext.to_path_buf(),
                message: "no recipients configured".to_string(),
            });
        }

        let mut args: Vec<&std::ffi::OsStr> = vec!["--encrypt".as_ref()];
        for recipient in recipients {
            args.push("-r".as_ref());
            args.push(recipient.as_ref());
        }
        args.push("-o".as_ref());
        args.push(output.as_os_str());
        args.push(plaintext.as_os_str());

        let result = self.run(&args)?;
        if !result.status.success() {
            return Err(failure("encryption", plaintext, &result));
        }

        Ok(())
    }
}

fn failure(operation: &'static str, path: &Path, output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Error::Crypto {
        operation,
        path: path.to_path_buf(),
        message: if stderr.is_empty() {
            format!("age exited with {}", output.status)
        } else {
            stderr
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_age_not_found() {
        let backend = AgeBackend::with_program("mmdot-test-no-such-age-binary");
        assert!(!backend.is_available());

        let err = backend
            .decrypt(Path::new("hosts.toml.age"), Path::new("key.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::AgeNotFound));
    }

    #[test]
    fn test_encrypt_requires_recipients() {
        let backend = AgeBackend::new();
        let err = backend
            .encrypt(Path::new("in"), Path::new("out"), &[])
            .unwrap_err();
        assert!(err.to_string().contains("no recipients"));
    }
}
