//! C-ABI FFI
//!
//! Heap-allocated handle around a [`RingBuffer`] borrowing C-owned
//! storage. Every function null-checks its arguments and returns
//! `0`/NULL for invalid input, matching the count-or-zero contract of
//! the Rust API.
//!
//! Data-path calls only ever borrow the handle shared, so a producer
//! context (`rb_write`, `rb_advance`) and a consumer context (`rb_read`,
//! `rb_skip`, `rb_peek`, `rb_find`) may run at the same time, and an
//! event callback may query its own handle. `rb_reset`, `rb_free`,
//! `rb_set_evt_fn` and `rb_destroy` need both sides quiesced.
//!
//! Author: Moroya Sakamoto

use core::ptr::{self, NonNull};
use core::slice;

use crate::event::{Event, EventHook};
use crate::ring::{Mode, RingBuffer};

/// Event kind passed to [`RbEvtFn`]
pub const RB_EVT_READ: u8 = 0;
/// Event kind passed to [`RbEvtFn`]
pub const RB_EVT_WRITE: u8 = 1;
/// Event kind passed to [`RbEvtFn`]
pub const RB_EVT_RESET: u8 = 2;

/// `flags` bit for [`rb_write_ex`] / [`rb_read_ex`]: transfer all or nothing
pub const RB_FLAG_ALL: u16 = 0x0001;

/// C event callback: `(handle, kind, len)`
pub type RbEvtFn = extern "C" fn(*mut RbHandle, u8, usize);

/// Opaque handle
pub struct RbHandle {
    ring: RingBuffer<'static>,
    hook: Option<NonNull<CHook>>,
}

struct CHook {
    handle: *mut RbHandle,
    f: RbEvtFn,
}

// The handle pointer is only forwarded back to C, never dereferenced here.
unsafe impl Sync for CHook {}

impl EventHook for CHook {
    fn on_event(&self, event: Event, len: usize) {
        let kind = match event {
            Event::Read => RB_EVT_READ,
            Event::Write => RB_EVT_WRITE,
            Event::Reset => RB_EVT_RESET,
        };
        (self.f)(self.handle, kind, len);
    }
}

fn mode_from_flags(flags: u16) -> Mode {
    if flags & RB_FLAG_ALL != 0 {
        Mode::AllOrNothing
    } else {
        Mode::Partial
    }
}

/// Create a ring buffer over `size` bytes at `data`
///
/// Returns NULL if `data` is NULL or `size` is 0.
///
/// # Safety
/// `data` must point to `size` writable bytes that outlive the handle
/// and are not accessed by anything else while the handle exists.
#[no_mangle]
pub unsafe extern "C" fn rb_init(data: *mut u8, size: usize) -> *mut RbHandle {
    if data.is_null() || size == 0 {
        return ptr::null_mut();
    }
    // SAFETY: guaranteed by the caller.
    let storage = unsafe { slice::from_raw_parts_mut(data, size) };
    match RingBuffer::new(storage) {
        Ok(ring) => Box::into_raw(Box::new(RbHandle { ring, hook: None })),
        Err(_) => ptr::null_mut(),
    }
}

/// Destroy a handle created by [`rb_init`] (storage is not touched)
///
/// # Safety
/// `h` must come from [`rb_init`] and not be used afterwards; no other
/// call on `h` may be in progress.
#[no_mangle]
pub unsafe extern "C" fn rb_destroy(h: *mut RbHandle) {
    if h.is_null() {
        return;
    }
    // SAFETY: `h` came from `Box::into_raw` in `rb_init`.
    let handle = unsafe { Box::from_raw(h) };
    let RbHandle { ring, hook } = *handle;
    drop(ring);
    if let Some(hook) = hook {
        // SAFETY: allocated in `rb_set_evt_fn`; the ring referencing it is gone.
        drop(unsafe { Box::from_raw(hook.as_ptr()) });
    }
}

/// Borrow the handle shared, or `None` for NULL
///
/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`].
unsafe fn handle<'h>(h: *mut RbHandle) -> Option<&'h RbHandle> {
    // SAFETY: guaranteed by the caller.
    unsafe { h.as_ref() }
}

/// Borrow the handle exclusively, or `None` for NULL
///
/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`], and no other call
/// on `h` may be in progress.
unsafe fn handle_mut<'h>(h: *mut RbHandle) -> Option<&'h mut RbHandle> {
    // SAFETY: guaranteed by the caller.
    unsafe { h.as_mut() }
}

/// `1` if the handle is usable, `0` otherwise
///
/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`].
#[no_mangle]
pub unsafe extern "C" fn rb_is_ready(h: *mut RbHandle) -> u8 {
    let h = unsafe { handle(h) };
    h.map_or(0, |h| h.ring.is_ready() as u8)
}

/// Detach the handle from its storage
///
/// # Safety
/// `h` must be NULL or a live handle; neither side may be mid-operation.
#[no_mangle]
pub unsafe extern "C" fn rb_free(h: *mut RbHandle) {
    if let Some(h) = unsafe { handle_mut(h) } {
        h.ring.detach();
    }
}

/// Install, replace (`f` non-NULL) or clear (`f` NULL) the event callback
///
/// Returns `1` on success, `0` for a NULL or detached handle.
///
/// # Safety
/// `h` must be NULL or a live handle; neither side may be mid-operation.
#[no_mangle]
pub unsafe extern "C" fn rb_set_evt_fn(h: *mut RbHandle, f: Option<RbEvtFn>) -> u8 {
    let Some(rb) = (unsafe { handle_mut(h) }) else {
        return 0;
    };
    if !rb.ring.is_ready() {
        return 0;
    }

    let previous = match f {
        Some(f) => {
            let hook = NonNull::from(Box::leak(Box::new(CHook { handle: h, f })));
            // SAFETY: the hook stays allocated until it is replaced,
            // cleared or the handle is destroyed, and the ring is
            // repointed or dropped before that.
            rb.ring.set_event_hook(unsafe { &*hook.as_ptr() });
            rb.hook.replace(hook)
        }
        None => {
            rb.ring.clear_event_hook();
            rb.hook.take()
        }
    };
    if let Some(old) = previous {
        // SAFETY: allocated by an earlier `rb_set_evt_fn`; the ring no
        // longer references it.
        drop(unsafe { Box::from_raw(old.as_ptr()) });
    }
    1
}

/// Clear both cursors
///
/// # Safety
/// `h` must be NULL or a live handle; neither side may be mid-operation.
#[no_mangle]
pub unsafe extern "C" fn rb_reset(h: *mut RbHandle) {
    if let Some(h) = unsafe { handle_mut(h) } {
        h.ring.reset();
    }
}

/// Write up to `len` bytes; returns the count written
///
/// # Safety
/// `h` must be NULL or a live handle; `data` must point to `len` bytes;
/// only one context may act as producer.
#[no_mangle]
pub unsafe extern "C" fn rb_write(h: *mut RbHandle, data: *const u8, len: usize) -> usize {
    let mut written = 0;
    unsafe { rb_write_ex(h, data, len, &mut written, 0) };
    written
}

/// Write with `flags`; stores the count in `*written` (may be NULL)
///
/// Returns `1` on success, `0` otherwise.
///
/// # Safety
/// `h` must be NULL or a live handle; `data` must point to `len` bytes;
/// `written` must be NULL or writable; only one context may act as
/// producer.
#[no_mangle]
pub unsafe extern "C" fn rb_write_ex(
    h: *mut RbHandle,
    data: *const u8,
    len: usize,
    written: *mut usize,
    flags: u16,
) -> u8 {
    let Some(h) = (unsafe { handle(h) }) else {
        return 0;
    };
    if data.is_null() || len == 0 {
        return 0;
    }
    // SAFETY: guaranteed by the caller.
    let data = unsafe { slice::from_raw_parts(data, len) };
    // SAFETY: the caller runs the only producer context.
    match unsafe { h.ring.produce(data, mode_from_flags(flags)) } {
        Ok(n) => {
            if let Some(out) = unsafe { written.as_mut() } {
                *out = n;
            }
            1
        }
        Err(_) => 0,
    }
}

/// Read up to `len` bytes; returns the count read
///
/// # Safety
/// `h` must be NULL or a live handle; `out` must point to `len` writable
/// bytes; only one context may act as consumer.
#[no_mangle]
pub unsafe extern "C" fn rb_read(h: *mut RbHandle, out: *mut u8, len: usize) -> usize {
    let mut read = 0;
    unsafe { rb_read_ex(h, out, len, &mut read, 0) };
    read
}

/// Read with `flags`; stores the count in `*read` (may be NULL)
///
/// Returns `1` on success, `0` otherwise.
///
/// # Safety
/// `h` must be NULL or a live handle; `out` must point to `len` writable
/// bytes; `read` must be NULL or writable; only one context may act as
/// consumer.
#[no_mangle]
pub unsafe extern "C" fn rb_read_ex(
    h: *mut RbHandle,
    out: *mut u8,
    len: usize,
    read: *mut usize,
    flags: u16,
) -> u8 {
    let Some(h) = (unsafe { handle(h) }) else {
        return 0;
    };
    if out.is_null() || len == 0 {
        return 0;
    }
    // SAFETY: guaranteed by the caller.
    let out = unsafe { slice::from_raw_parts_mut(out, len) };
    // SAFETY: the caller runs the only consumer context.
    match unsafe { h.ring.consume(out, mode_from_flags(flags)) } {
        Ok(n) => {
            if let Some(r) = unsafe { read.as_mut() } {
                *r = n;
            }
            1
        }
        Err(_) => 0,
    }
}

/// Copy up to `len` bytes without consuming, after skipping `skip`
///
/// # Safety
/// `h` must be NULL or a live handle; `out` must point to `len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn rb_peek(h: *mut RbHandle, skip: usize, out: *mut u8, len: usize) -> usize {
    let Some(h) = (unsafe { handle(h) }) else {
        return 0;
    };
    if out.is_null() || len == 0 {
        return 0;
    }
    // SAFETY: guaranteed by the caller.
    let out = unsafe { slice::from_raw_parts_mut(out, len) };
    h.ring.peek_at(skip, out)
}

/// # Safety
/// `h` must be NULL or a live handle; only one context may act as consumer.
#[no_mangle]
pub unsafe extern "C" fn rb_skip(h: *mut RbHandle, len: usize) -> usize {
    let h = unsafe { handle(h) };
    // SAFETY: the caller runs the only consumer context.
    h.map_or(0, |h| unsafe { h.ring.skip_unchecked(len) })
}

/// # Safety
/// `h` must be NULL or a live handle; only one context may act as producer.
#[no_mangle]
pub unsafe extern "C" fn rb_advance(h: *mut RbHandle, len: usize) -> usize {
    let h = unsafe { handle(h) };
    // SAFETY: the caller runs the only producer context.
    h.map_or(0, |h| unsafe { h.ring.advance_unchecked(len) })
}

/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`].
#[no_mangle]
pub unsafe extern "C" fn rb_get_free(h: *mut RbHandle) -> usize {
    let h = unsafe { handle(h) };
    h.map_or(0, |h| h.ring.free_len())
}

/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`].
#[no_mangle]
pub unsafe extern "C" fn rb_get_full(h: *mut RbHandle) -> usize {
    let h = unsafe { handle(h) };
    h.map_or(0, |h| h.ring.full_len())
}

/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`].
#[no_mangle]
pub unsafe extern "C" fn rb_get_linear_block_read_address(h: *mut RbHandle) -> *mut u8 {
    let h = unsafe { handle(h) };
    h.and_then(|h| h.ring.linear_read_address())
        .map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`].
#[no_mangle]
pub unsafe extern "C" fn rb_get_linear_block_read_length(h: *mut RbHandle) -> usize {
    let h = unsafe { handle(h) };
    h.map_or(0, |h| h.ring.linear_read_length())
}

/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`].
#[no_mangle]
pub unsafe extern "C" fn rb_get_linear_block_write_address(h: *mut RbHandle) -> *mut u8 {
    let h = unsafe { handle(h) };
    h.and_then(|h| h.ring.linear_write_address())
        .map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// # Safety
/// `h` must be NULL or a live handle from [`rb_init`].
#[no_mangle]
pub unsafe extern "C" fn rb_get_linear_block_write_length(h: *mut RbHandle) -> usize {
    let h = unsafe { handle(h) };
    h.map_or(0, |h| h.ring.linear_write_length())
}

/// Search for `len` bytes at `needle`; stores the offset in `*found_idx`
///
/// Returns `1` if found, `0` otherwise.
///
/// # Safety
/// `h` must be NULL or a live handle; `needle` must point to `len`
/// bytes; `found_idx` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rb_find(
    h: *mut RbHandle,
    needle: *const u8,
    len: usize,
    start_offset: usize,
    found_idx: *mut usize,
) -> u8 {
    let Some(h) = (unsafe { handle(h) }) else {
        return 0;
    };
    if needle.is_null() || len == 0 || found_idx.is_null() {
        return 0;
    }
    // SAFETY: guaranteed by the caller.
    let needle = unsafe { slice::from_raw_parts(needle, len) };
    unsafe { *found_idx = 0 };
    match h.ring.find_from(needle, start_offset) {
        Some(idx) => {
            unsafe { *found_idx = idx };
            1
        }
        None => 0,
    }
}
