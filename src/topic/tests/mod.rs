//! Test modules for publish/subscribe topics

mod subscriber;
