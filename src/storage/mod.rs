pub mod file;
pub mod memory;
pub mod trait_def;

pub use file::{FileCookieJar, JarError};
pub use memory::MemoryCookieStore;
pub use trait_def::CookieStore;
