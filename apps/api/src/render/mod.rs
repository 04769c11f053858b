// HTML rendering for resumes.
// Pure functions only; no I/O happens here.

pub mod document;
pub mod section;

pub use document::render_document;
