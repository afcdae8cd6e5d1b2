//! Read and write services over the album repository.

pub mod read;
pub mod write;

pub use read::AlbumReadService;
pub use write::{parse_version_token, AlbumWriteService, UpdateParams};
