pub mod automation;
pub mod cursor;
pub mod sound;
pub mod window;
