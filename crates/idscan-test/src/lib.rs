#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock;

pub use mock::{
    MockConfig, MockDetectionBackend, MockRecognitionBackend, create_mock_backends,
    default_detections,
};
