pub mod ntfs;
