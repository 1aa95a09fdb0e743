// montage - multi-modal content generation over a hosted predictions API

pub mod orchestration;
