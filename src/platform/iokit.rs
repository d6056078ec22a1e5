//! macOS implementation over IOKit power management.
//!
//! Assertions go through `IOPMAssertionCreateWithDescription` with
//! `TimeoutActionRelease`, so the OS itself releases a wedged assertion once
//! the backstop interval elapses. Battery capacity is read from the IOKit
//! power-source snapshot.

use std::collections::HashMap;
use std::os::raw::{c_uchar, c_void};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::debug;

use crate::assertion::AssertionKind;
use crate::error::PlatformError;
use crate::platform::{AssertionId, AssertionProps, BatterySource, PowerApi};

#[allow(non_camel_case_types)]
type CFTypeRef = *const c_void;
#[allow(non_camel_case_types)]
type CFStringRef = *const c_void;
#[allow(non_camel_case_types)]
type CFArrayRef = *const c_void;
#[allow(non_camel_case_types)]
type CFDictionaryRef = *const c_void;
#[allow(non_camel_case_types)]
type CFAllocatorRef = *const c_void;
#[allow(non_camel_case_types)]
type CFIndex = isize;
#[allow(non_camel_case_types)]
type CFTimeInterval = f64;
#[allow(non_camel_case_types)]
type CFNumberType = CFIndex;
#[allow(non_camel_case_types)]
type IOPMAssertionID = u32;
#[allow(non_camel_case_types)]
type IOReturn = i32;
#[allow(non_camel_case_types)]
type Boolean = u8;

const KCF_STRING_ENCODING_UTF8: u32 = 0x0800_0100;
const KCF_NUMBER_INT_TYPE: CFNumberType = 9;
const KIO_RETURN_SUCCESS: IOReturn = 0;

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFStringCreateWithBytes(
        alloc: CFAllocatorRef,
        bytes: *const c_uchar,
        num_bytes: CFIndex,
        encoding: u32,
        is_external: Boolean,
    ) -> CFStringRef;
    fn CFRelease(cf: CFTypeRef);
    fn CFArrayGetCount(array: CFArrayRef) -> CFIndex;
    fn CFArrayGetValueAtIndex(array: CFArrayRef, idx: CFIndex) -> CFTypeRef;
    fn CFDictionaryGetValue(dict: CFDictionaryRef, key: CFTypeRef) -> CFTypeRef;
    fn CFNumberGetValue(number: CFTypeRef, number_type: CFNumberType, out: *mut c_void) -> Boolean;
}

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOPMAssertionCreateWithDescription(
        assertion_type: CFStringRef,
        name: CFStringRef,
        details: CFStringRef,
        human_readable_reason: CFStringRef,
        localization_bundle_path: CFStringRef,
        timeout: CFTimeInterval,
        timeout_action: CFStringRef,
        assertion_id: *mut IOPMAssertionID,
    ) -> IOReturn;
    fn IOPMAssertionRelease(assertion_id: IOPMAssertionID) -> IOReturn;
    fn IOPSCopyPowerSourcesInfo() -> CFTypeRef;
    fn IOPSCopyPowerSourcesList(blob: CFTypeRef) -> CFArrayRef;
    fn IOPSGetPowerSourceDescription(blob: CFTypeRef, ps: CFTypeRef) -> CFDictionaryRef;
}

/// Owned CFString with scoped release.
struct CfString(CFStringRef);

impl CfString {
    fn new(s: &str) -> Self {
        let raw = unsafe {
            CFStringCreateWithBytes(
                std::ptr::null(),
                s.as_ptr(),
                s.len() as CFIndex,
                KCF_STRING_ENCODING_UTF8,
                0,
            )
        };
        Self(raw)
    }

    fn get(&self) -> CFStringRef {
        self.0
    }
}

impl Drop for CfString {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { CFRelease(self.0) };
        }
    }
}

/// Owned CF object released on drop.
struct CfOwned(CFTypeRef);

impl Drop for CfOwned {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { CFRelease(self.0) };
        }
    }
}

/// Power-assertion facility backed by `IOPMAssertionCreateWithDescription`.
pub struct IoKitPower {
    next_id: AtomicU64,
    held: Mutex<HashMap<u64, IOPMAssertionID>>,
}

impl IoKitPower {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            held: Mutex::new(HashMap::new()),
        }
    }
}

impl PowerApi for IoKitPower {
    fn acquire(
        &self,
        kind: AssertionKind,
        props: &AssertionProps,
    ) -> Result<AssertionId, PlatformError> {
        let assertion_type = CfString::new(kind.assertion_type());
        let name = CfString::new(&props.name);
        let reason = CfString::new(&props.reason);
        let timeout_action = CfString::new("TimeoutActionRelease");
        let interval = props.timeout.as_secs_f64();

        let mut raw_id: IOPMAssertionID = 0;
        let status = unsafe {
            IOPMAssertionCreateWithDescription(
                assertion_type.get(),
                name.get(),
                std::ptr::null(),
                reason.get(),
                std::ptr::null(),
                interval,
                timeout_action.get(),
                &mut raw_id,
            )
        };
        if status != KIO_RETURN_SUCCESS {
            return Err(PlatformError::AssertionRejected {
                kind: kind.to_string(),
                status,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.held.lock().unwrap().insert(id, raw_id);
        debug!("acquired {kind} as IOPM assertion {raw_id}");
        Ok(AssertionId(id))
    }

    fn release(&self, id: AssertionId) -> Result<(), PlatformError> {
        let raw_id = self
            .held
            .lock()
            .unwrap()
            .remove(&id.0)
            .ok_or(PlatformError::UnknownAssertion(id.0))?;
        let status = unsafe { IOPMAssertionRelease(raw_id) };
        debug!("released IOPM assertion {raw_id} (status {status})");
        Ok(())
    }
}

/// Battery probe over the IOKit power-source snapshot.
pub struct IoKitBattery;

impl IoKitBattery {
    pub fn new() -> Self {
        Self
    }

    /// Reads `(current, max)` capacity of the first power source, if any.
    fn read_capacity() -> Option<(i32, i32)> {
        unsafe {
            let blob = CfOwned(IOPSCopyPowerSourcesInfo());
            if blob.0.is_null() {
                return None;
            }
            let list = CfOwned(IOPSCopyPowerSourcesList(blob.0) as CFTypeRef);
            if list.0.is_null() || CFArrayGetCount(list.0) == 0 {
                return None;
            }
            let ps = CFArrayGetValueAtIndex(list.0, 0);
            // Owned by the snapshot, not released here.
            let desc = IOPSGetPowerSourceDescription(blob.0, ps);
            if desc.is_null() {
                return None;
            }
            let current = dict_i32(desc, "Current Capacity")?;
            let max = dict_i32(desc, "Max Capacity")?;
            Some((current, max))
        }
    }
}

unsafe fn dict_i32(dict: CFDictionaryRef, key: &str) -> Option<i32> {
    let key = CfString::new(key);
    let value = CFDictionaryGetValue(dict, key.get());
    if value.is_null() {
        return None;
    }
    let mut out: i32 = 0;
    let ok = CFNumberGetValue(value, KCF_NUMBER_INT_TYPE, &mut out as *mut i32 as *mut c_void);
    if ok == 0 {
        return None;
    }
    Some(out)
}

impl BatterySource for IoKitBattery {
    fn has_battery(&self) -> bool {
        Self::read_capacity().is_some()
    }

    fn capacity_percent(&self) -> Option<f32> {
        let (current, max) = Self::read_capacity()?;
        if max <= 0 {
            return None;
        }
        Some(current as f32 * 100.0 / max as f32)
    }
}
