//! Feature modules consumed by the activation controller.

pub mod translator;
