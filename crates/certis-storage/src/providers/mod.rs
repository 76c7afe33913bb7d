//! Backend implementations of the provider contract.

pub mod database;
pub mod disk;
pub mod r2;
pub mod s3;
mod s3compat;

pub use database::{BlobStore, DatabaseBuilder, DatabaseProvider, StoredBlob};
pub use disk::{DiskBuilder, DiskProvider};
pub use r2::{R2Builder, R2Provider};
pub use s3::{S3Builder, S3Provider};

/// Join an optional folder prefix and file name into an object key.
pub(crate) fn object_key(folder: &str, file_name: &str) -> String {
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", folder.trim_end_matches('/'), file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::object_key;

    #[test]
    fn test_object_key_joins_folder() {
        assert_eq!(object_key("", "a.txt"), "a.txt");
        assert_eq!(object_key("reports", "a.txt"), "reports/a.txt");
        assert_eq!(object_key("reports/", "a.txt"), "reports/a.txt");
    }
}
