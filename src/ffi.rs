//! FFI bindings for Session DVs
//!
//! This module provides C-compatible functions for calling the engine from the
//! study front end. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `dvs_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{session_to_dvs_json, AggregationOutcome, DvProcessor};
use crate::schema::parse_context;
use crate::sink::{MemorySink, NdjsonFileSink, PersistenceSink};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// JSON report for a processor outcome
fn outcome_to_json(outcome: &AggregationOutcome) -> Result<String, serde_json::Error> {
    let report = match outcome {
        AggregationOutcome::AlreadyComputed => serde_json::json!({ "status": "already_computed" }),
        AggregationOutcome::Aborted { reason } => {
            serde_json::json!({ "status": "aborted", "reason": reason })
        }
        AggregationOutcome::Computed { payload, persisted } => serde_json::json!({
            "status": "computed",
            "persisted": persisted,
            "payload": payload,
        }),
    };
    serde_json::to_string(&report)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute the persistence payload JSON for a session context JSON document.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `dvs_free_string`.
/// - Returns NULL on error; call `dvs_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn dvs_session_to_json(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match session_to_dvs_json(json_str) {
        Ok(payload) => string_to_cstr(&payload),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a DvProcessor
pub struct DvProcessorHandle {
    processor: DvProcessor<Box<dyn PersistenceSink>>,
}

/// Create a new processor.
///
/// # Safety
/// - `sink_path` may be NULL (payloads kept in memory) or a valid C string
///   naming an NDJSON file to append payloads to.
/// - Returns NULL if `sink_path` is not valid UTF-8.
/// - Must be freed with `dvs_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn dvs_processor_new(sink_path: *const c_char) -> *mut DvProcessorHandle {
    clear_last_error();

    let sink: Box<dyn PersistenceSink> = if sink_path.is_null() {
        Box::new(MemorySink::new())
    } else {
        match cstr_to_string(sink_path) {
            Some(path) => Box::new(NdjsonFileSink::new(path)),
            None => {
                set_last_error("Invalid sink path string");
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(DvProcessorHandle {
        processor: DvProcessor::new(sink),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `dvs_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn dvs_processor_free(processor: *mut DvProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Process a session context and return an outcome report JSON.
///
/// The report has a `status` of `computed`, `already_computed` or `aborted`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `dvs_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `dvs_free_string`.
/// - Returns NULL if the context cannot be parsed.
#[no_mangle]
pub unsafe extern "C" fn dvs_processor_process(
    processor: *mut DvProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let ctx = match parse_context(&json_str) {
        Ok(ctx) => ctx,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let handle = &mut *processor;
    let outcome = handle.processor.process(&ctx);
    match outcome_to_json(&outcome) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save the processor's one-shot state to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `dvs_processor_new`.
/// - Returns a newly allocated string that must be freed with `dvs_free_string`.
#[no_mangle]
pub unsafe extern "C" fn dvs_processor_save_state(
    processor: *const DvProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    match handle.processor.save_state() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load one-shot state from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `dvs_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn dvs_processor_load_state(
    processor: *mut DvProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    let handle = &mut *processor;
    match handle.processor.load_state(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Free a string returned by Session DVs functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Session DVs function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn dvs_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Session DVs call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn dvs_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn dvs_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_context_json() -> CString {
        CString::new(
            r#"{
            "sessionId": "ffi-session",
            "simulationOutcomes": [
                { "scenarioId": 1, "decision": { "label": "Safety" } }
            ],
            "simulationMetrics": {
                "livesSaved": 20000, "humanCasualties": 0, "firefightingResource": 100,
                "infrastructureCondition": 100, "biodiversityCondition": 100,
                "propertiesCondition": 100, "nuclearPowerStation": 100
            },
            "matchedStableValues": ["Safety"]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_session_to_json() {
        let json = sample_context_json();

        unsafe {
            let result = dvs_session_to_json(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(value["sessionId"], "ffi-session");
            assert_eq!(value["performanceComposite"], 1.0);

            dvs_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = dvs_processor_new(ptr::null());
            assert!(!processor.is_null());

            let json = sample_context_json();
            let first = dvs_processor_process(processor, json.as_ptr());
            assert!(!first.is_null());
            let report: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(first).to_str().unwrap()).unwrap();
            assert_eq!(report["status"], "computed");
            assert_eq!(report["persisted"], true);
            dvs_free_string(first);

            let second = dvs_processor_process(processor, json.as_ptr());
            let report: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(second).to_str().unwrap()).unwrap();
            assert_eq!(report["status"], "already_computed");
            dvs_free_string(second);

            // Carry the one-shot state into a new processor
            let state = dvs_processor_save_state(processor);
            assert!(!state.is_null());
            let processor2 = dvs_processor_new(ptr::null());
            assert_eq!(dvs_processor_load_state(processor2, state), 0);

            let third = dvs_processor_process(processor2, json.as_ptr());
            let report: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(third).to_str().unwrap()).unwrap();
            assert_eq!(report["status"], "already_computed");
            dvs_free_string(third);

            dvs_free_string(state);
            dvs_processor_free(processor);
            dvs_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = dvs_session_to_json(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = dvs_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_missing_metrics_is_error_for_stateless_call() {
        unsafe {
            let json = CString::new(r#"{ "sessionId": "s" }"#).unwrap();
            let result = dvs_session_to_json(json.as_ptr());
            assert!(result.is_null());

            let error_str = CStr::from_ptr(dvs_last_error()).to_str().unwrap();
            assert!(error_str.contains("Missing precondition"));
        }
    }

    #[test]
    fn test_ffi_processor_rejects_non_utf8_sink_path() {
        let path = CString::new(b"/tmp/\xff.ndjson".to_vec()).unwrap();

        unsafe {
            let processor = dvs_processor_new(path.as_ptr());
            assert!(processor.is_null());

            let error = dvs_last_error();
            assert!(!error.is_null());
            assert_eq!(
                CStr::from_ptr(error).to_str().unwrap(),
                "Invalid sink path string"
            );
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = dvs_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
