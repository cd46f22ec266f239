//! NTFS master file table location
//!
//! Decodes the boot sector, the `$MFT` self-record and its `$DATA` run-list.
//! Nothing beyond the self-record is parsed.

pub mod boot_sector;
mod reader;
pub mod record;
pub mod runlist;

pub use boot_sector::BootParameters;
pub use reader::{MftLayout, MftReader};
pub use record::{DataAttribute, MetadataRecord, walk_attributes};
pub use runlist::{decode_run_list, encode_run, encode_run_list};
