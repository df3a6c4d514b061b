mod projector;

pub use projector::{build_body_frame, build_header_frame};
