pub mod text;
pub mod selection;
pub mod clipboard;
pub mod capture;
pub mod features;
pub mod activation;
