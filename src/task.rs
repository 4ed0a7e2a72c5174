//! Named worker-thread spawning.
//!
//! Every thread the core starts (dispatch loop, poller, handler fan-out)
//! goes through [`spawn_named`] so it carries a readable name in panics
//! and debuggers, and an explicit stack size.

use std::io;
use std::thread::{Builder, JoinHandle};

/// Spawn a named thread with an explicit stack size.
pub fn spawn_named<F, T>(name: impl Into<String>, stack_kb: usize, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let name = name.into();
    let stack_bytes = stack_kb
        .checked_mul(1024)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "stack size overflows usize"))?;
    log::trace!("Spawning '{}' (stack={}KB)", name, stack_kb);

    Builder::new().name(name).stack_size(stack_bytes).spawn(f)
}
