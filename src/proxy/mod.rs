// Image proxy - upstream bytes with a local on-disk store
mod handlers;
mod store;

pub use handlers::{ImageQuery, image_handler};
pub use store::{ImageStore, spawn_prefetch};
