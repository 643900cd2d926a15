pub mod framebuffer;
pub mod types;
pub mod utils;

pub use framebuffer::MockFramebuffer;
pub use types::{Phase, Snapshot, SnapshotError, SnapshotResult};
pub use utils::{
    format_timestamp, generate_filename, sanitize_name, save_screenshot, write_manifest,
};
