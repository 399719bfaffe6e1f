#[cfg(feature = "calamine")]
pub mod calamine;
pub mod memory;
#[cfg(feature = "umya")]
pub mod umya;

#[cfg(feature = "calamine")]
pub use calamine::CalamineBackend;
pub use memory::{MemoryBackend, MemoryBook};
#[cfg(feature = "umya")]
pub use umya::UmyaBackend;
