pub mod animation;
pub mod frame;
pub mod input;
pub mod time;
pub mod viewport;
