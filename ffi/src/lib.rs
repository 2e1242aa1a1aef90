//! C-ABI wrapper around `post-core`.
//!
//! # Overview
//! Exposes the post request builders, response parsers and form validation
//! through `extern "C"` functions, so a native shell with a C FFI can drive
//! the post lifecycle without linking an async runtime. The shell executes
//! every request itself (host-does-IO).
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `post_build_submit` is the form's submit step: it validates, picks
//!   create or update from the optional seed id, and attaches the image only
//!   when it differs from the seed's.
//! - A single `FfiPostResult` envelope with `FfiDataTag` + `void* data`
//!   carries success payloads and errors uniformly.
//! - The C caller owns all returned pointers and releases them with the
//!   matching `post_free_*` function.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use post_core::{
    validation, ApiError, Field, FormMode, HttpResponse, ImageRef, Post, PostClient, PostId,
    SubmitTarget, Submission,
};

use types::*;

/// Bit set by `post_validate` when the title is invalid.
pub const POST_INVALID_TITLE: u32 = 1;
/// Bit set by `post_validate` when the description is invalid.
pub const POST_INVALID_DESCRIPTION: u32 = 1 << 1;

/// Borrow a C string; null and invalid UTF-8 read as `None`.
fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `PostClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or not valid UTF-8.
/// The caller must free the returned pointer with `post_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn post_client_new(base_url: *const c_char) -> *mut FfiPostClient {
    catch_unwind(|| {
        let Some(url) = read_str(base_url) else {
            return std::ptr::null_mut();
        };
        Box::into_raw(Box::new(FfiPostClient {
            inner: PostClient::new(url),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `post_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn post_client_free(client: *mut FfiPostClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request listing every post.
///
/// Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn post_build_list_posts(client: *const FfiPostClient) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_list_posts())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request fetching one post.
///
/// Returns null if `client` or `id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn post_build_get_post(
    client: *const FfiPostClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(id) = read_str(id) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_get_post(&PostId::new(id)))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request deleting one post.
///
/// Returns null if `client` or `id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn post_build_delete_post(
    client: *const FfiPostClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(id) = read_str(id) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_delete_post(&PostId::new(id)))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the create or update request for a form submission.
///
/// `seed_id` null means create; otherwise the post with that id is updated.
/// `seed_image_url` is the image the seed post already has (may be null).
/// `image_uri` is the currently selected image (may be null); in update mode
/// it is only attached when it differs from `seed_image_url`.
///
/// Returns null if `client` is null or the fields fail validation; call
/// `post_validate` to find out which.
#[unsafe(no_mangle)]
pub extern "C" fn post_build_submit(
    client: *const FfiPostClient,
    seed_id: *const c_char,
    seed_image_url: *const c_char,
    title: *const c_char,
    description: *const c_char,
    image_uri: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };

        let mode = match read_str(seed_id) {
            Some(id) => FormMode::Edit(Post {
                id: PostId::new(id),
                title: String::new(),
                description: String::new(),
                image_url: read_str(seed_image_url).map(str::to_string),
            }),
            None => FormMode::Create,
        };
        let image = read_str(image_uri).map(ImageRef::new);

        let submission = match Submission::prepare(
            &mode,
            read_str(title).unwrap_or_default(),
            read_str(description).unwrap_or_default(),
            image.as_ref(),
        ) {
            Ok(submission) => submission,
            Err(_) => return std::ptr::null_mut(),
        };

        let req = match &submission.target {
            SubmitTarget::Create => client.inner.build_create_post(&submission.payload),
            SubmitTarget::Update(id) => client.inner.build_update_post(id, &submission.payload),
        };
        FfiHttpRequest::from_core(req)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Validate form fields. Returns 0 when both are valid, otherwise an OR of
/// `POST_INVALID_TITLE` and `POST_INVALID_DESCRIPTION`. Null reads as empty.
#[unsafe(no_mangle)]
pub extern "C" fn post_validate(title: *const c_char, description: *const c_char) -> u32 {
    catch_unwind(|| {
        let errors = match validation::validate(
            read_str(title).unwrap_or_default(),
            read_str(description).unwrap_or_default(),
        ) {
            Ok(()) => return 0,
            Err(errors) => errors,
        };
        errors.iter().fold(0, |flags, err| {
            flags
                | match err.field() {
                    Field::Title => POST_INVALID_TITLE,
                    Field::Description => POST_INVALID_DESCRIPTION,
                }
        })
    })
    .unwrap_or(POST_INVALID_TITLE | POST_INVALID_DESCRIPTION)
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: read_str(resp.body).unwrap_or_default().to_string(),
    }
}

/// Shared null checks and conversion for every `post_parse_*` function.
fn parse_with<T>(
    client: *const FfiPostClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&PostClient, HttpResponse) -> Result<T, ApiError>,
    ok: impl FnOnce(T) -> *mut FfiPostResult,
) -> *mut FfiPostResult {
    if client.is_null() {
        return FfiPostResult::null_arg("client");
    }
    if response.is_null() {
        return FfiPostResult::null_arg("response");
    }
    let client = unsafe { &*client };
    let resp = unsafe { &*response };
    match parse(&client.inner, ffi_response_to_core(resp)) {
        Ok(value) => ok(value),
        Err(e) => FfiPostResult::from_error(e),
    }
}

/// Parse a list-posts response. `data_tag = PostList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn post_parse_list_posts(
    client: *const FfiPostClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostResult {
    catch_unwind(|| {
        parse_with(client, response, PostClient::parse_list_posts, FfiPostResult::ok_post_list)
    })
    .unwrap_or_else(|_| FfiPostResult::panic("panic in post_parse_list_posts"))
}

/// Parse a get-post response. `data_tag = Post` on success.
#[unsafe(no_mangle)]
pub extern "C" fn post_parse_get_post(
    client: *const FfiPostClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostResult {
    catch_unwind(|| {
        parse_with(client, response, PostClient::parse_get_post, FfiPostResult::ok_post)
    })
    .unwrap_or_else(|_| FfiPostResult::panic("panic in post_parse_get_post"))
}

/// Parse a create response. `data_tag = Post` on success.
#[unsafe(no_mangle)]
pub extern "C" fn post_parse_create_post(
    client: *const FfiPostClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostResult {
    catch_unwind(|| {
        parse_with(client, response, PostClient::parse_create_post, FfiPostResult::ok_post)
    })
    .unwrap_or_else(|_| FfiPostResult::panic("panic in post_parse_create_post"))
}

/// Parse an update response. `data_tag = Post` on success.
#[unsafe(no_mangle)]
pub extern "C" fn post_parse_update_post(
    client: *const FfiPostClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostResult {
    catch_unwind(|| {
        parse_with(client, response, PostClient::parse_update_post, FfiPostResult::ok_post)
    })
    .unwrap_or_else(|_| FfiPostResult::panic("panic in post_parse_update_post"))
}

/// Parse a delete response. `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn post_parse_delete_post(
    client: *const FfiPostClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostResult {
    catch_unwind(|| {
        parse_with(client, response, PostClient::parse_delete_post, |()| {
            FfiPostResult::ok_empty()
        })
    })
    .unwrap_or_else(|_| FfiPostResult::panic("panic in post_parse_delete_post"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `post_build_*` function. Safe with null.
#[unsafe(no_mangle)]
pub extern "C" fn post_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.path);
        for header in unsafe { from_raw_slice(req.headers, req.headers_len) } {
            free_c_string(header.key);
            free_c_string(header.value);
        }
        for part in unsafe { from_raw_slice(req.parts, req.parts_len) } {
            part.free_fields();
        }
    });
}

/// Free a result returned by any `post_parse_*` function. Safe with null.
/// `data_tag` decides what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn post_free_result(result: *mut FfiPostResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Post => {
                let post = unsafe { Box::from_raw(result.data as *mut FfiPost) };
                post.free_fields();
            }
            FfiDataTag::PostList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiPostList) };
                for item in unsafe { from_raw_slice(list.items, list.len) } {
                    item.free_fields();
                }
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe with null.
#[unsafe(no_mangle)]
pub extern "C" fn post_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
