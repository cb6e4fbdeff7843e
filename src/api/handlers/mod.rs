mod buckets;
mod health;

pub use buckets::{create_bucket, delete_file, download_file, list_files, upload_file};
pub use health::health;
