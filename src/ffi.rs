//! FFI bindings for MindBloom
//!
//! C-compatible functions for calling the scoring pipeline from other languages.
//! All strings are null-terminated; returned strings are allocated here and
//! must be released with `mindbloom_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::PipelineConfig;
use crate::error::ComputeError;
use crate::pipeline::{emotion_stability_to_json, emotion_state_to_json, FuzzyPipeline};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a result back across the boundary: JSON on success, NULL plus
/// `[CODE] message` in the last-error slot on failure
fn finish(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&format!("[{}] {}", e.code(), e));
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score an `/emotion_state` request.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mindbloom_free_string`.
/// - Returns NULL on error; call `mindbloom_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mindbloom_emotion_state(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(emotion_state_to_json(&json_str))
}

/// Score emotional stability from `{"emotion": [...]}`.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mindbloom_free_string`.
/// - Returns NULL on error; call `mindbloom_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mindbloom_emotion_stability(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(emotion_stability_to_json(&json_str))
}

// ============================================================================
// Reusable Pipeline API
// ============================================================================

/// Opaque handle to a FuzzyPipeline
pub struct PipelineHandle {
    pipeline: FuzzyPipeline,
}

/// Create a pipeline from a JSON configuration, or the defaults when `config_json` is NULL.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Returns a pointer that must be freed with `mindbloom_pipeline_free`.
/// - Returns NULL on error; call `mindbloom_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mindbloom_pipeline_new(config_json: *const c_char) -> *mut PipelineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        Ok(PipelineConfig::default())
    } else {
        match cstr_to_string(config_json) {
            Some(s) => PipelineConfig::from_json(&s),
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        }
    };

    match config.and_then(FuzzyPipeline::with_config) {
        Ok(pipeline) => Box::into_raw(Box::new(PipelineHandle { pipeline })),
        Err(e) => {
            set_last_error(&format!("[{}] {}", e.code(), e));
            ptr::null_mut()
        }
    }
}

/// Free a pipeline.
///
/// # Safety
/// - `pipeline` must be a pointer returned by `mindbloom_pipeline_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mindbloom_pipeline_free(pipeline: *mut PipelineHandle) {
    if !pipeline.is_null() {
        drop(Box::from_raw(pipeline));
    }
}

/// Score an `/emotion_state` request with a reusable pipeline, honouring its failure policy.
///
/// # Safety
/// - `pipeline` must be a valid pointer returned by `mindbloom_pipeline_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mindbloom_free_string`.
/// - Returns NULL on error; call `mindbloom_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mindbloom_pipeline_process(
    pipeline: *const PipelineHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if pipeline.is_null() {
        set_last_error("Null pipeline pointer");
        return ptr::null_mut();
    }

    let handle = &*pipeline;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(handle.pipeline.process_json(&json_str))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by any MindBloom function.
///
/// # Safety
/// - `s` must be a pointer returned by a MindBloom function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mindbloom_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next MindBloom call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn mindbloom_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn mindbloom_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_request;
    use std::ffi::CString;

    fn sample_json() -> CString {
        CString::new(serde_json::to_string(&sample_request()).unwrap()).unwrap()
    }

    #[test]
    fn test_ffi_emotion_state() {
        let json = sample_json();

        unsafe {
            let result = mindbloom_emotion_state(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("focus_score"));
            assert!(result_str.contains("motor_engagement_score"));
            assert!(result_str.contains("emotion_stability_score"));

            mindbloom_free_string(result);
        }
    }

    #[test]
    fn test_ffi_emotion_stability() {
        let request = serde_json::json!({ "emotion": sample_request().emotion });
        let json = CString::new(request.to_string()).unwrap();

        unsafe {
            let result = mindbloom_emotion_stability(json.as_ptr());
            assert!(!result.is_null());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.starts_with("{\"emotion_stability_score\":"));
            mindbloom_free_string(result);
        }
    }

    #[test]
    fn test_ffi_pipeline_lifecycle() {
        unsafe {
            let config = CString::new(r#"{"failure_policy": "partial"}"#).unwrap();
            let pipeline = mindbloom_pipeline_new(config.as_ptr());
            assert!(!pipeline.is_null());

            let mut request = sample_request();
            request.speed.pop();
            let json = CString::new(serde_json::to_string(&request).unwrap()).unwrap();

            let result = mindbloom_pipeline_process(pipeline, json.as_ptr());
            assert!(!result.is_null());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("\"motor_engagement_score\":null"));
            assert!(result_str.contains("VALIDATION_ERROR"));

            mindbloom_free_string(result);
            mindbloom_pipeline_free(pipeline);
        }
    }

    #[test]
    fn test_ffi_default_pipeline() {
        unsafe {
            let pipeline = mindbloom_pipeline_new(ptr::null());
            assert!(!pipeline.is_null());

            let json = sample_json();
            let result = mindbloom_pipeline_process(pipeline, json.as_ptr());
            assert!(!result.is_null());

            mindbloom_free_string(result);
            mindbloom_pipeline_free(pipeline);
        }
    }

    #[test]
    fn test_ffi_bad_config() {
        unsafe {
            let config = CString::new(r#"{"degeneracy_fallback": 4.0}"#).unwrap();
            let pipeline = mindbloom_pipeline_new(config.as_ptr());
            assert!(pipeline.is_null());

            let error_str = CStr::from_ptr(mindbloom_last_error()).to_str().unwrap();
            assert!(error_str.starts_with("[CONFIGURATION_ERROR]"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();

            let result = mindbloom_emotion_state(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = mindbloom_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.starts_with("[JSON_ERROR]"));
        }
    }

    #[test]
    fn test_ffi_null_pointers() {
        unsafe {
            assert!(mindbloom_emotion_state(ptr::null()).is_null());
            assert!(mindbloom_pipeline_process(ptr::null(), ptr::null()).is_null());
            mindbloom_free_string(ptr::null_mut());
            mindbloom_pipeline_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = mindbloom_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::VERSION);
        }
    }
}
