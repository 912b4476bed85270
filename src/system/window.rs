pub mod headless;

pub use headless::HeadlessSurface;
