//! Event bus adapters.
//!
//! - `InMemoryEventBus` - The process-wide synchronous bus
//! - `WatermarkGuard` - Wrapper keeping delta consumers monotonic per type

mod in_memory;
mod watermark_guard;

pub use in_memory::InMemoryEventBus;
pub use watermark_guard::WatermarkGuard;
