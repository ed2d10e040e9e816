//! Control device access: capability traits + alsa-lib backend.

use std::fmt;

use serde::Serialize;

// ── Error type ──

/// Control device errors.
///
/// `Sys` carries the negative return code of the failing alsa-lib call
/// together with its `snd_strerror` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    Sys {
        call: &'static str,
        code: i32,
        message: String,
    },
    InvalidName(String),
    Unsupported(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Sys {
                call,
                code,
                message,
            } => write!(f, "{call} failed: {message} ({code})"),
            DeviceError::InvalidName(name) => write!(f, "Invalid control device name: {name:?}"),
            DeviceError::Unsupported(e) => write!(f, "Unsupported platform: {e}"),
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Traits ──

/// An element info block, as filled in by the last info query.
pub trait ElemInfo {
    fn name(&self) -> String;
    /// Raw alsa-lib type code (`SND_CTL_ELEM_TYPE_*`).
    fn type_code(&self) -> u32;
    /// Number of value slots.
    fn count(&self) -> u32;
    fn is_readable(&self) -> bool;

    /// Integer bounds via the 32-bit accessors.
    fn min(&self) -> i64;
    fn max(&self) -> i64;
    fn step(&self) -> i64;

    /// Integer64 bounds via the 64-bit accessors.
    fn min64(&self) -> i64;
    fn max64(&self) -> i64;
    fn step64(&self) -> i64;

    /// Number of items of an enumerated element.
    fn items(&self) -> u32;
    /// Select the enum item whose name the next info query resolves.
    fn set_item(&mut self, index: u32);
    /// Name of the item selected by [`set_item`](ElemInfo::set_item), valid
    /// after a successful re-query.
    fn item_name(&self) -> String;
}

/// The raw value block of an element, read in one go.
pub trait ElemValue {
    fn boolean(&self, index: u32) -> bool;
    fn integer(&self, index: u32) -> i64;
    fn integer64(&self, index: u32) -> i64;
    fn enumerated(&self, index: u32) -> u32;
}

/// An open control device.
///
/// The handle is released when the value is dropped, so every exit path of
/// a caller that owns the device closes it exactly once.
pub trait ControlDevice {
    type Elem: Copy;
    type Info: ElemInfo;
    type Value: ElemValue;

    fn open(name: &str) -> Result<Self>
    where
        Self: Sized;
    /// Name the device was opened with.
    fn name(&self) -> &str;
    /// Load the element list.
    fn load(&mut self) -> Result<()>;
    /// Elements in device order.
    fn elements(&self) -> Vec<Self::Elem>;
    /// Query a fresh info block for `elem`.
    fn info(&self, elem: Self::Elem) -> Result<Self::Info>;
    /// Re-query `info` in place, honoring its selected enum item.
    fn refresh_info(&self, elem: Self::Elem, info: &mut Self::Info) -> Result<()>;
    fn read(&self, elem: Self::Elem) -> Result<Self::Value>;
    /// The device's own name for a type code.
    fn type_name(&self, type_code: u32) -> String;
}

// ── Linux implementation ──

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::ffi::{CStr, CString};
    use std::os::raw::{c_char, c_int};
    use std::ptr::{self, NonNull};

    use alsa_sys as sys;

    /// Highest type code alsa-lib can name (`SND_CTL_ELEM_TYPE_LAST`).
    const TYPE_CODE_LAST: u32 = 6;

    const ENOMEM: c_int = 12;

    fn strerror(code: c_int) -> String {
        // SAFETY: snd_strerror returns a pointer to a static NUL-terminated string.
        let msg = unsafe { sys::snd_strerror(code) };
        if msg.is_null() {
            format!("error {code}")
        } else {
            unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
        }
    }

    fn check(call: &'static str, rc: c_int) -> Result<()> {
        if rc < 0 {
            Err(DeviceError::Sys {
                call,
                code: rc,
                message: strerror(rc),
            })
        } else {
            Ok(())
        }
    }

    fn out_of_memory(call: &'static str) -> DeviceError {
        DeviceError::Sys {
            call,
            code: -ENOMEM,
            message: strerror(-ENOMEM),
        }
    }

    /// Copy a C string owned by alsa-lib.
    ///
    /// # Safety
    /// `ptr` must be null or point to a valid NUL-terminated string.
    unsafe fn owned_string(ptr: *const c_char) -> String {
        if ptr.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    /// High-level control handle (`snd_hctl_t`).
    pub struct AlsaDevice {
        handle: NonNull<sys::snd_hctl_t>,
        name: String,
    }

    /// Element pointer owned by the parent [`AlsaDevice`]; valid until it is dropped.
    #[derive(Debug, Clone, Copy)]
    pub struct AlsaElem(NonNull<sys::snd_hctl_elem_t>);

    pub struct AlsaInfo(NonNull<sys::snd_ctl_elem_info_t>);

    impl AlsaInfo {
        fn alloc() -> Result<Self> {
            let mut raw = ptr::null_mut();
            // SAFETY: out-pointer to a local; freed in Drop.
            check("snd_ctl_elem_info_malloc", unsafe {
                sys::snd_ctl_elem_info_malloc(&mut raw)
            })?;
            NonNull::new(raw)
                .map(AlsaInfo)
                .ok_or_else(|| out_of_memory("snd_ctl_elem_info_malloc"))
        }

        fn ptr(&self) -> *mut sys::snd_ctl_elem_info_t {
            self.0.as_ptr()
        }
    }

    impl Drop for AlsaInfo {
        fn drop(&mut self) {
            unsafe { sys::snd_ctl_elem_info_free(self.ptr()) }
        }
    }

    // SAFETY (all accessors below): `self.0` is a live info block allocated by
    // snd_ctl_elem_info_malloc and only freed on drop.
    impl ElemInfo for AlsaInfo {
        fn name(&self) -> String {
            unsafe { owned_string(sys::snd_ctl_elem_info_get_name(self.ptr())) }
        }
        fn type_code(&self) -> u32 {
            unsafe { sys::snd_ctl_elem_info_get_type(self.ptr()) as u32 }
        }
        fn count(&self) -> u32 {
            unsafe { sys::snd_ctl_elem_info_get_count(self.ptr()) as u32 }
        }
        fn is_readable(&self) -> bool {
            unsafe { sys::snd_ctl_elem_info_is_readable(self.ptr()) != 0 }
        }
        fn min(&self) -> i64 {
            unsafe { sys::snd_ctl_elem_info_get_min(self.ptr()) as i64 }
        }
        fn max(&self) -> i64 {
            unsafe { sys::snd_ctl_elem_info_get_max(self.ptr()) as i64 }
        }
        fn step(&self) -> i64 {
            unsafe { sys::snd_ctl_elem_info_get_step(self.ptr()) as i64 }
        }
        fn min64(&self) -> i64 {
            unsafe { sys::snd_ctl_elem_info_get_min64(self.ptr()) as i64 }
        }
        fn max64(&self) -> i64 {
            unsafe { sys::snd_ctl_elem_info_get_max64(self.ptr()) as i64 }
        }
        fn step64(&self) -> i64 {
            unsafe { sys::snd_ctl_elem_info_get_step64(self.ptr()) as i64 }
        }
        fn items(&self) -> u32 {
            unsafe { sys::snd_ctl_elem_info_get_items(self.ptr()) as u32 }
        }
        fn set_item(&mut self, index: u32) {
            unsafe { sys::snd_ctl_elem_info_set_item(self.ptr(), index as _) }
        }
        fn item_name(&self) -> String {
            unsafe { owned_string(sys::snd_ctl_elem_info_get_item_name(self.ptr())) }
        }
    }

    pub struct AlsaValue(NonNull<sys::snd_ctl_elem_value_t>);

    impl AlsaValue {
        fn alloc() -> Result<Self> {
            let mut raw = ptr::null_mut();
            // SAFETY: out-pointer to a local; freed in Drop.
            check("snd_ctl_elem_value_malloc", unsafe {
                sys::snd_ctl_elem_value_malloc(&mut raw)
            })?;
            NonNull::new(raw)
                .map(AlsaValue)
                .ok_or_else(|| out_of_memory("snd_ctl_elem_value_malloc"))
        }

        fn ptr(&self) -> *mut sys::snd_ctl_elem_value_t {
            self.0.as_ptr()
        }
    }

    impl Drop for AlsaValue {
        fn drop(&mut self) {
            unsafe { sys::snd_ctl_elem_value_free(self.ptr()) }
        }
    }

    impl ElemValue for AlsaValue {
        fn boolean(&self, index: u32) -> bool {
            unsafe { sys::snd_ctl_elem_value_get_boolean(self.ptr(), index as _) != 0 }
        }
        fn integer(&self, index: u32) -> i64 {
            unsafe { sys::snd_ctl_elem_value_get_integer(self.ptr(), index as _) as i64 }
        }
        fn integer64(&self, index: u32) -> i64 {
            unsafe { sys::snd_ctl_elem_value_get_integer64(self.ptr(), index as _) as i64 }
        }
        fn enumerated(&self, index: u32) -> u32 {
            unsafe { sys::snd_ctl_elem_value_get_enumerated(self.ptr(), index as _) as u32 }
        }
    }

    impl ControlDevice for AlsaDevice {
        type Elem = AlsaElem;
        type Info = AlsaInfo;
        type Value = AlsaValue;

        fn open(name: &str) -> Result<Self> {
            let c_name =
                CString::new(name).map_err(|_| DeviceError::InvalidName(name.to_string()))?;
            let mut raw = ptr::null_mut();
            // SAFETY: out-pointer to a local, NUL-terminated name.
            check("snd_hctl_open", unsafe {
                sys::snd_hctl_open(&mut raw, c_name.as_ptr(), 0)
            })?;
            let handle = NonNull::new(raw).ok_or_else(|| out_of_memory("snd_hctl_open"))?;
            log::debug!("opened control device {name}");
            Ok(AlsaDevice {
                handle,
                name: name.to_string(),
            })
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn load(&mut self) -> Result<()> {
            check("snd_hctl_load", unsafe {
                sys::snd_hctl_load(self.handle.as_ptr())
            })
        }

        fn elements(&self) -> Vec<AlsaElem> {
            let mut elems = Vec::new();
            // SAFETY: the element list belongs to the open handle and is
            // walked with first/next until null.
            let mut cur = unsafe { sys::snd_hctl_first_elem(self.handle.as_ptr()) };
            while let Some(elem) = NonNull::new(cur) {
                elems.push(AlsaElem(elem));
                cur = unsafe { sys::snd_hctl_elem_next(elem.as_ptr()) };
            }
            elems
        }

        fn info(&self, elem: AlsaElem) -> Result<AlsaInfo> {
            let mut info = AlsaInfo::alloc()?;
            self.refresh_info(elem, &mut info)?;
            Ok(info)
        }

        fn refresh_info(&self, elem: AlsaElem, info: &mut AlsaInfo) -> Result<()> {
            check("snd_hctl_elem_info", unsafe {
                sys::snd_hctl_elem_info(elem.0.as_ptr(), info.ptr())
            })
        }

        fn read(&self, elem: AlsaElem) -> Result<AlsaValue> {
            let value = AlsaValue::alloc()?;
            check("snd_hctl_elem_read", unsafe {
                sys::snd_hctl_elem_read(elem.0.as_ptr(), value.ptr())
            })?;
            Ok(value)
        }

        fn type_name(&self, type_code: u32) -> String {
            // snd_ctl_elem_type_name asserts on codes past the last known type.
            if type_code > TYPE_CODE_LAST {
                return format!("UNKNOWN({type_code})");
            }
            unsafe { owned_string(sys::snd_ctl_elem_type_name(type_code as _)) }
        }
    }

    impl Drop for AlsaDevice {
        fn drop(&mut self) {
            let rc = unsafe { sys::snd_hctl_close(self.handle.as_ptr()) };
            if rc < 0 {
                log::warn!("closing {}: {}", self.name, strerror(rc));
            } else {
                log::debug!("closed control device {}", self.name);
            }
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux_impl::{AlsaDevice, AlsaElem, AlsaInfo, AlsaValue};

// ── Stub device for unsupported platforms ──

/// Uninhabited handle type for the stub backend.
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Clone, Copy)]
pub enum Never {}

#[cfg(not(target_os = "linux"))]
impl ElemInfo for Never {
    fn name(&self) -> String {
        match *self {}
    }
    fn type_code(&self) -> u32 {
        match *self {}
    }
    fn count(&self) -> u32 {
        match *self {}
    }
    fn is_readable(&self) -> bool {
        match *self {}
    }
    fn min(&self) -> i64 {
        match *self {}
    }
    fn max(&self) -> i64 {
        match *self {}
    }
    fn step(&self) -> i64 {
        match *self {}
    }
    fn min64(&self) -> i64 {
        match *self {}
    }
    fn max64(&self) -> i64 {
        match *self {}
    }
    fn step64(&self) -> i64 {
        match *self {}
    }
    fn items(&self) -> u32 {
        match *self {}
    }
    fn set_item(&mut self, _index: u32) {
        match *self {}
    }
    fn item_name(&self) -> String {
        match *self {}
    }
}

#[cfg(not(target_os = "linux"))]
impl ElemValue for Never {
    fn boolean(&self, _index: u32) -> bool {
        match *self {}
    }
    fn integer(&self, _index: u32) -> i64 {
        match *self {}
    }
    fn integer64(&self, _index: u32) -> i64 {
        match *self {}
    }
    fn enumerated(&self, _index: u32) -> u32 {
        match *self {}
    }
}

/// Placeholder device that always fails to open.
/// Enables compilation and `cargo test` on hosts without alsa-lib.
#[cfg(not(target_os = "linux"))]
pub struct StubDevice(Never);

#[cfg(not(target_os = "linux"))]
impl ControlDevice for StubDevice {
    type Elem = Never;
    type Info = Never;
    type Value = Never;

    fn open(_name: &str) -> Result<Self> {
        Err(DeviceError::Unsupported(
            "ALSA control devices are only available on Linux".into(),
        ))
    }
    fn name(&self) -> &str {
        match self.0 {}
    }
    fn load(&mut self) -> Result<()> {
        match self.0 {}
    }
    fn elements(&self) -> Vec<Never> {
        match self.0 {}
    }
    fn info(&self, elem: Never) -> Result<Never> {
        match elem {}
    }
    fn refresh_info(&self, elem: Never, _info: &mut Never) -> Result<()> {
        match elem {}
    }
    fn read(&self, elem: Never) -> Result<Never> {
        match elem {}
    }
    fn type_name(&self, _type_code: u32) -> String {
        match self.0 {}
    }
}

/// Concrete device type for the current platform.
#[cfg(target_os = "linux")]
pub type PlatformDevice = AlsaDevice;
#[cfg(not(target_os = "linux"))]
pub type PlatformDevice = StubDevice;

// ── Card discovery ──

/// A sound card and the control device that addresses it.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredCard {
    pub index: i32,
    /// Control device id, e.g. `hw:0`.
    pub device: String,
    pub name: String,
    pub long_name: String,
}

/// Enumerate sound cards. Always empty on unsupported platforms.
pub fn enumerate_cards() -> Vec<DiscoveredCard> {
    #[cfg(target_os = "linux")]
    {
        enumerate_cards_linux()
    }
    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

#[cfg(target_os = "linux")]
fn enumerate_cards_linux() -> Vec<DiscoveredCard> {
    let mut cards = Vec::new();
    for card in alsa::card::Iter::new() {
        let card = match card {
            Ok(c) => c,
            Err(e) => {
                log::debug!("error iterating cards: {e}");
                continue;
            }
        };
        let index = card.get_index();
        let name = card.get_name().unwrap_or_else(|_| "Unknown".to_string());
        let long_name = card.get_longname().unwrap_or_else(|_| name.clone());
        cards.push(DiscoveredCard {
            index,
            device: format!("hw:{index}"),
            name,
            long_name,
        });
    }
    cards
}

// ── Mock device (for testing) ──

/// In-memory mock device for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use crate::value::SlotValues;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// One scripted element. `items` entries set to `None` fail their lookup.
    #[derive(Debug, Clone)]
    pub struct MockElement {
        pub name: String,
        pub type_code: u32,
        pub count: u32,
        pub readable: bool,
        pub min: i64,
        pub max: i64,
        pub step: i64,
        pub items: Vec<Option<String>>,
        pub values: Vec<i64>,
        /// If true, the info query for this element fails.
        pub fail_info: bool,
        /// If true, reading the value fails.
        pub fail_read: bool,
    }

    impl MockElement {
        pub fn new(name: &str, type_code: u32, values: &[i64]) -> Self {
            MockElement {
                name: name.into(),
                type_code,
                count: values.len() as u32,
                readable: true,
                min: 0,
                max: 0,
                step: 0,
                items: Vec::new(),
                values: values.to_vec(),
                fail_info: false,
                fail_read: false,
            }
        }

        pub fn boolean(name: &str, values: &[bool]) -> Self {
            let raw: Vec<i64> = values.iter().map(|&b| b as i64).collect();
            Self::new(name, 1, &raw)
        }

        pub fn integer(name: &str, min: i64, max: i64, step: i64, values: &[i64]) -> Self {
            MockElement {
                min,
                max,
                step,
                ..Self::new(name, 2, values)
            }
        }

        pub fn integer64(name: &str, min: i64, max: i64, step: i64, values: &[i64]) -> Self {
            MockElement {
                min,
                max,
                step,
                ..Self::new(name, 6, values)
            }
        }

        pub fn enumerated(name: &str, items: &[&str], values: &[i64]) -> Self {
            MockElement {
                items: items.iter().map(|s| Some(s.to_string())).collect(),
                ..Self::new(name, 3, values)
            }
        }

        pub fn unreadable(mut self) -> Self {
            self.readable = false;
            self
        }
    }

    /// Info block snapshot of a [`MockElement`].
    #[derive(Debug, Clone)]
    pub struct MockInfo {
        elem: MockElement,
        item: Option<u32>,
        item_name: String,
    }

    impl ElemInfo for MockInfo {
        fn name(&self) -> String {
            self.elem.name.clone()
        }
        fn type_code(&self) -> u32 {
            self.elem.type_code
        }
        fn count(&self) -> u32 {
            self.elem.count
        }
        fn is_readable(&self) -> bool {
            self.elem.readable
        }
        fn min(&self) -> i64 {
            self.elem.min
        }
        fn max(&self) -> i64 {
            self.elem.max
        }
        fn step(&self) -> i64 {
            self.elem.step
        }
        fn min64(&self) -> i64 {
            self.elem.min
        }
        fn max64(&self) -> i64 {
            self.elem.max
        }
        fn step64(&self) -> i64 {
            self.elem.step
        }
        fn items(&self) -> u32 {
            self.elem.items.len() as u32
        }
        fn set_item(&mut self, index: u32) {
            self.item = Some(index);
        }
        fn item_name(&self) -> String {
            self.item_name.clone()
        }
    }

    thread_local! {
        static NEXT_OPEN: RefCell<Vec<MockElement>> = const { RefCell::new(Vec::new()) };
    }

    /// Elements handed to the next [`MockDevice::open`] on this thread.
    /// Unseeded opens yield an empty device.
    pub fn seed_next_open(elements: Vec<MockElement>) {
        NEXT_OPEN.with(|next| *next.borrow_mut() = elements);
    }

    /// Scripted control device. Counts how often it is dropped (closed)
    /// through a shared counter so tests can observe release after the
    /// device has been moved into the code under test.
    pub struct MockDevice {
        name: String,
        pub elements: Vec<MockElement>,
        /// If true, `load` returns an error.
        pub fail_load: bool,
        loaded: bool,
        closes: Rc<Cell<usize>>,
        /// Recorded info queries: (element index, selected item).
        pub info_queries: RefCell<Vec<(usize, Option<u32>)>>,
        /// Recorded value reads (element index).
        pub reads: RefCell<Vec<usize>>,
    }

    impl MockDevice {
        pub fn new(name: &str) -> Self {
            MockDevice {
                name: name.into(),
                elements: Vec::new(),
                fail_load: false,
                loaded: false,
                closes: Rc::new(Cell::new(0)),
                info_queries: RefCell::new(Vec::new()),
                reads: RefCell::new(Vec::new()),
            }
        }

        pub fn with_elements(name: &str, elements: Vec<MockElement>) -> Self {
            let mut dev = Self::new(name);
            dev.elements = elements;
            dev
        }

        /// Shared close counter, still readable after the device is dropped.
        pub fn close_counter(&self) -> Rc<Cell<usize>> {
            Rc::clone(&self.closes)
        }

        fn element(&self, elem: usize) -> Result<&MockElement> {
            self.elements.get(elem).ok_or_else(|| DeviceError::Sys {
                call: "snd_hctl_elem_info",
                code: -2,
                message: "No such file or directory".into(),
            })
        }
    }

    impl ControlDevice for MockDevice {
        type Elem = usize;
        type Info = MockInfo;
        type Value = SlotValues;

        fn open(name: &str) -> Result<Self> {
            let elements = NEXT_OPEN.with(|next| next.take());
            Ok(Self::with_elements(name, elements))
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn load(&mut self) -> Result<()> {
            if self.fail_load {
                return Err(DeviceError::Sys {
                    call: "snd_hctl_load",
                    code: -5,
                    message: "mock: load failure injected".into(),
                });
            }
            self.loaded = true;
            Ok(())
        }

        fn elements(&self) -> Vec<usize> {
            if !self.loaded {
                return Vec::new();
            }
            (0..self.elements.len()).collect()
        }

        fn info(&self, elem: usize) -> Result<MockInfo> {
            let element = self.element(elem)?;
            let mut info = MockInfo {
                elem: element.clone(),
                item: None,
                item_name: String::new(),
            };
            self.refresh_info(elem, &mut info)?;
            Ok(info)
        }

        fn refresh_info(&self, elem: usize, info: &mut MockInfo) -> Result<()> {
            self.info_queries.borrow_mut().push((elem, info.item));
            let element = self.element(elem)?;
            if element.fail_info {
                return Err(DeviceError::Sys {
                    call: "snd_hctl_elem_info",
                    code: -5,
                    message: "mock: info failure injected".into(),
                });
            }
            if let Some(item) = info.item {
                match element.items.get(item as usize) {
                    Some(Some(name)) => info.item_name = name.clone(),
                    _ => {
                        return Err(DeviceError::Sys {
                            call: "snd_hctl_elem_info",
                            code: -22,
                            message: "mock: item lookup failure injected".into(),
                        });
                    }
                }
            }
            Ok(())
        }

        fn read(&self, elem: usize) -> Result<SlotValues> {
            self.reads.borrow_mut().push(elem);
            let element = self.element(elem)?;
            if element.fail_read {
                return Err(DeviceError::Sys {
                    call: "snd_hctl_elem_read",
                    code: -5,
                    message: "mock: read failure injected".into(),
                });
            }
            Ok(SlotValues::new(element.values.clone()))
        }

        fn type_name(&self, type_code: u32) -> String {
            match type_code {
                0 => "NONE".into(),
                1 => "BOOLEAN".into(),
                2 => "INTEGER".into(),
                3 => "ENUMERATED".into(),
                4 => "BYTES".into(),
                5 => "IEC958".into(),
                6 => "INTEGER64".into(),
                other => format!("UNKNOWN({other})"),
            }
        }
    }

    impl Drop for MockDevice {
        fn drop(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }
}
