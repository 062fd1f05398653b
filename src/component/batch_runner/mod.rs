mod main;
mod manifest;

pub use main::{BatchError, BatchRunner, BatchSummary, manifest_requests, thumbnail_requests};
pub use manifest::{JobManifest, ManifestDefaults, ManifestJob, ManifestJobKind, load_manifest};
