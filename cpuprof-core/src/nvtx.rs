//! NVTX-Style Annotations
//!
//! Named, colored ranges that show up as rows in the nsys timeline. With the
//! `nvtx` feature the calls go straight to `libnvToolsExt`; without it every
//! call is a no-op apart from the per-thread nesting counter, so annotated
//! code runs unchanged on machines without the CUDA toolkit.
//!
//! ```ignore
//! use cpuprof_core::{Color, Range};
//!
//! let _load = Range::colored("LoadData", Color::BLUE);
//! // ... work shows up under "LoadData" in nsys
//! ```

use crate::measure::{Timer, format_seconds};
use std::cell::Cell;

/// ARGB color attached to a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    #[allow(missing_docs)]
    pub const RED: Color = Color(0xFFFF_0000);
    #[allow(missing_docs)]
    pub const GREEN: Color = Color(0xFF00_FF00);
    #[allow(missing_docs)]
    pub const BLUE: Color = Color(0xFF00_00FF);
    #[allow(missing_docs)]
    pub const YELLOW: Color = Color(0xFFFF_FF00);
    #[allow(missing_docs)]
    pub const CYAN: Color = Color(0xFF00_FFFF);
    #[allow(missing_docs)]
    pub const MAGENTA: Color = Color(0xFFFF_00FF);
    #[allow(missing_docs)]
    pub const PURPLE: Color = Color(0xFF80_0080);
    #[allow(missing_docs)]
    pub const ORANGE: Color = Color(0xFFFF_A500);
    #[allow(missing_docs)]
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    /// Look up a color by its lowercase name
    pub fn from_name(name: &str) -> Option<Color> {
        Some(match name.to_ascii_lowercase().as_str() {
            "red" => Color::RED,
            "green" => Color::GREEN,
            "blue" => Color::BLUE,
            "yellow" => Color::YELLOW,
            "cyan" => Color::CYAN,
            "magenta" => Color::MAGENTA,
            "purple" => Color::PURPLE,
            "orange" => Color::ORANGE,
            "white" => Color::WHITE,
            _ => return None,
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::GREEN
    }
}

/// A named NVTX domain. Ranges in different domains get separate timeline rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Domain(pub &'static str);

impl Domain {
    /// The process-wide default domain
    pub const DEFAULT: Domain = Domain("");

    /// Domain name, empty for the default domain
    pub fn name(&self) -> &'static str {
        self.0
    }

    #[cfg_attr(not(feature = "nvtx"), allow(dead_code))]
    fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Current range nesting depth on this thread
pub fn depth() -> usize {
    DEPTH.with(|d| d.get())
}

/// Whether ranges reach a real NVTX library in this build
pub fn is_available() -> bool {
    cfg!(feature = "nvtx")
}

/// Open a range. Every push must be matched by a [`range_pop`] on the same thread.
pub fn range_push(message: &str, color: Color, domain: Domain) {
    DEPTH.with(|d| d.set(d.get() + 1));
    backend::push(message, color, domain);
}

/// Close the innermost range in `domain`. Ignored when no range is open.
pub fn range_pop(domain: Domain) {
    let open = DEPTH.with(|d| {
        let cur = d.get();
        if cur > 0 {
            d.set(cur - 1);
        }
        cur > 0
    });
    if open {
        backend::pop(domain);
    } else {
        tracing::debug!(domain = domain.name(), "range_pop with no open range");
    }
}

/// Drop an instantaneous marker on the timeline
pub fn mark(message: &str) {
    backend::mark(message);
}

/// RAII range guard; the range closes when the guard drops.
#[must_use = "the range closes as soon as the guard is dropped"]
pub struct Range {
    domain: Domain,
}

impl Range {
    /// Open a range in the default domain with the default color
    pub fn new(message: &str) -> Self {
        Self::in_domain(message, Color::default(), Domain::DEFAULT)
    }

    /// Open a colored range in the default domain
    pub fn colored(message: &str, color: Color) -> Self {
        Self::in_domain(message, color, Domain::DEFAULT)
    }

    /// Open a colored range in a specific domain
    pub fn in_domain(message: &str, color: Color, domain: Domain) -> Self {
        range_push(message, color, domain);
        Self { domain }
    }
}

impl Drop for Range {
    fn drop(&mut self) {
        range_pop(self.domain);
    }
}

/// Run `f` inside a named range.
pub fn annotate<T>(message: &str, color: Color, f: impl FnOnce() -> T) -> T {
    let _range = Range::colored(message, color);
    f()
}

/// Run `f` inside a named range and print how long it took.
pub fn profile_function<T>(name: &str, color: Color, f: impl FnOnce() -> T) -> T {
    let _range = Range::colored(name, color);
    let timer = Timer::start();
    let out = f();
    println!("{} took {}", name, format_seconds(timer.elapsed()));
    out
}

#[cfg(feature = "nvtx")]
mod backend {
    use super::{Color, Domain};
    use std::collections::HashMap;
    use std::ffi::{CString, c_char, c_void};
    use std::sync::{Mutex, OnceLock};

    const NVTX_VERSION: u16 = 2;
    const NVTX_COLOR_ARGB: i32 = 1;
    const NVTX_MESSAGE_TYPE_ASCII: i32 = 1;

    #[repr(C)]
    struct EventAttributes {
        version: u16,
        size: u16,
        category: u32,
        color_type: i32,
        color: u32,
        payload_type: i32,
        reserved0: i32,
        payload: u64,
        message_type: i32,
        message: *const c_char,
    }

    #[link(name = "nvToolsExt")]
    unsafe extern "C" {
        fn nvtxRangePushEx(attrib: *const EventAttributes) -> i32;
        fn nvtxRangePop() -> i32;
        fn nvtxMarkA(message: *const c_char);
        fn nvtxDomainCreateA(name: *const c_char) -> *mut c_void;
        fn nvtxDomainRangePushEx(domain: *mut c_void, attrib: *const EventAttributes) -> i32;
        fn nvtxDomainRangePop(domain: *mut c_void) -> i32;
    }

    // Domain handles are process-lifetime pointers owned by the NVTX runtime.
    fn domain_handle(domain: Domain) -> *mut c_void {
        static HANDLES: OnceLock<Mutex<HashMap<&'static str, usize>>> = OnceLock::new();
        let handles = HANDLES.get_or_init(|| Mutex::new(HashMap::new()));
        let mut handles = match handles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let handle = *handles.entry(domain.name()).or_insert_with(|| {
            let name = CString::new(domain.name()).unwrap_or_default();
            // SAFETY: `name` is a valid NUL-terminated string for the duration of the call.
            unsafe { nvtxDomainCreateA(name.as_ptr()) as usize }
        });
        handle as *mut c_void
    }

    pub(super) fn push(message: &str, color: Color, domain: Domain) {
        let msg = CString::new(message).unwrap_or_default();
        let attrib = EventAttributes {
            version: NVTX_VERSION,
            size: std::mem::size_of::<EventAttributes>() as u16,
            category: 0,
            color_type: NVTX_COLOR_ARGB,
            color: color.0,
            payload_type: 0,
            reserved0: 0,
            payload: 0,
            message_type: NVTX_MESSAGE_TYPE_ASCII,
            message: msg.as_ptr(),
        };
        // SAFETY: NVTX copies the message before returning.
        unsafe {
            if domain.is_default() {
                nvtxRangePushEx(&attrib);
            } else {
                nvtxDomainRangePushEx(domain_handle(domain), &attrib);
            }
        }
    }

    pub(super) fn pop(domain: Domain) {
        // SAFETY: called only when a matching push is open on this thread.
        unsafe {
            if domain.is_default() {
                nvtxRangePop();
            } else {
                nvtxDomainRangePop(domain_handle(domain));
            }
        }
    }

    pub(super) fn mark(message: &str) {
        let msg = CString::new(message).unwrap_or_default();
        // SAFETY: `msg` outlives the call.
        unsafe { nvtxMarkA(msg.as_ptr()) }
    }
}

#[cfg(not(feature = "nvtx"))]
mod backend {
    use super::{Color, Domain};

    #[inline(always)]
    pub(super) fn push(_message: &str, _color: Color, _domain: Domain) {}

    #[inline(always)]
    pub(super) fn pop(_domain: Domain) {}

    #[inline(always)]
    pub(super) fn mark(_message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_guard_tracks_depth() {
        assert_eq!(depth(), 0);
        {
            let _outer = Range::new("outer");
            assert_eq!(depth(), 1);
            {
                let _inner = Range::colored("inner", Color::RED);
                assert_eq!(depth(), 2);
            }
            assert_eq!(depth(), 1);
        }
        assert_eq!(depth(), 0);
    }

    #[test]
    fn test_unbalanced_pop_is_ignored() {
        range_pop(Domain::DEFAULT);
        assert_eq!(depth(), 0);
        range_push("x", Color::BLUE, Domain("DataOps"));
        range_pop(Domain("DataOps"));
        range_pop(Domain("DataOps"));
        assert_eq!(depth(), 0);
    }

    #[test]
    fn test_annotate_returns_value() {
        let v = annotate("sum", Color::YELLOW, || {
            assert_eq!(depth(), 1);
            3 * 7
        });
        assert_eq!(v, 21);
        assert_eq!(depth(), 0);
    }

    #[test]
    fn test_color_from_name() {
        assert_eq!(Color::from_name("Purple"), Some(Color::PURPLE));
        assert_eq!(Color::from_name("orange"), Some(Color::ORANGE));
        assert_eq!(Color::from_name("chartreuse"), None);
    }
}
