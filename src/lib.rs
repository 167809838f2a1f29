//! Fixed-capacity circular buffer.
//!
//! [`CircularBuffer`] holds at most `capacity` elements (always a power of
//! two) and decides at construction what a push into a full buffer does:
//! evict the oldest element ([`OverwritePolicy::Overwrite`]) or drop the new
//! one ([`OverwritePolicy::Ignore`]).
//!
//! ```
//! use circbuf::CircularBuffer;
//!
//! let mut buf: CircularBuffer<i32> = CircularBuffer::new(3); // rounded up to 4
//! buf.extend([100, 120, 125, 130, 150]);
//! assert_eq!(buf.to_string(), "[120, 125, 130, 150]");
//! assert_eq!(buf.pop(), Some(120));
//! ```

pub mod buffer;
pub mod capacity;
pub mod config;
pub mod iter;
pub mod policy;
pub mod render;

pub use buffer::{CircularBuffer, PushOutcome};
pub use capacity::{CapacityError, DEFAULT_CAPACITY};
pub use policy::{OverwritePolicy, ParsePolicyError};
