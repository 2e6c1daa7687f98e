use std::{io, path::Path};

/// Source of SSH private key bytes.
pub trait CredentialReader {
    fn read_key(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads keys from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsCredentialReader;

impl CredentialReader for FsCredentialReader {
    fn read_key(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

impl<R: CredentialReader + ?Sized> CredentialReader for &R {
    fn read_key(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read_key(path)
    }
}
