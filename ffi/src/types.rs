//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! instead of `String`, pointer plus length instead of `Vec`, and tagged
//! enums with explicit discriminants. Conversions live here so `lib.rs`
//! stays focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use post_core::{ApiError, FormPart, HttpMethod, HttpRequest, Post, PostClient};

/// Opaque handle to a `PostClient`.
pub struct FfiPostClient {
    pub(crate) inner: PostClient,
}

/// Heap-allocate `s` as a C string. Interior NULs yield an empty string.
pub(crate) fn to_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

fn opt_c_string(s: Option<String>) -> *mut c_char {
    s.map(to_c_string).unwrap_or(std::ptr::null_mut())
}

/// Release a string produced by `to_c_string`. Null is ignored.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak a vector as a pointer; empty vectors become null.
fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let mut items = items.into_boxed_slice();
    let ptr = items.as_mut_ptr();
    std::mem::forget(items);
    (ptr, len)
}

/// Reclaim a slice leaked by `into_raw_slice`.
///
/// # Safety
/// `ptr` and `len` must come from one `into_raw_slice` call.
pub(crate) unsafe fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiPartKind {
    Text = 0,
    File = 1,
}

/// One multipart field.
///
/// Text parts set `value`; file parts set `file_name`, `content_type` and
/// `uri`, which the host reads and uploads. Unused fields are null.
#[repr(C)]
pub struct FfiFormPart {
    pub kind: FfiPartKind,
    pub name: *mut c_char,
    pub value: *mut c_char,
    pub file_name: *mut c_char,
    pub content_type: *mut c_char,
    pub uri: *mut c_char,
}

impl From<FormPart> for FfiFormPart {
    fn from(part: FormPart) -> Self {
        match part {
            FormPart::Text { name, value } => FfiFormPart {
                kind: FfiPartKind::Text,
                name: to_c_string(name),
                value: to_c_string(value),
                file_name: std::ptr::null_mut(),
                content_type: std::ptr::null_mut(),
                uri: std::ptr::null_mut(),
            },
            FormPart::File {
                name,
                file_name,
                content_type,
                uri,
            } => FfiFormPart {
                kind: FfiPartKind::File,
                name: to_c_string(name),
                value: std::ptr::null_mut(),
                file_name: to_c_string(file_name),
                content_type: to_c_string(content_type),
                uri: to_c_string(uri),
            },
        }
    }
}

impl FfiFormPart {
    pub(crate) fn free_fields(&self) {
        free_c_string(self.name);
        free_c_string(self.value);
        free_c_string(self.file_name);
        free_c_string(self.content_type);
        free_c_string(self.uri);
    }
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `post_build_*` functions. The host executes it, encoding
/// `parts` as `multipart/form-data` when `parts_len > 0`, and passes the
/// response back through `post_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub parts: *mut FfiFormPart,
    pub parts_len: u32,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);

        let parts = req
            .body
            .map(|body| body.parts.into_iter().map(FfiFormPart::from).collect())
            .unwrap_or_default();
        let (parts, parts_len) = into_raw_slice(parts);

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: to_c_string(req.path),
            headers,
            headers_len,
            parts,
            parts_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// The C caller fills this after executing a request. The FFI layer reads
/// but never frees these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Deserialization = 3,
    Transport = 4,
    Panic = 5,
    NullArg = 6,
}

/// Tag that tells `post_free_result` what `FfiPostResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Post = 1,
    PostList = 2,
}

/// A post exposed to C. `image_url` is null when the post has no image.
#[repr(C)]
pub struct FfiPost {
    pub id: *mut c_char,
    pub title: *mut c_char,
    pub description: *mut c_char,
    pub image_url: *mut c_char,
}

impl From<Post> for FfiPost {
    fn from(post: Post) -> Self {
        FfiPost {
            id: to_c_string(post.id.as_str()),
            title: to_c_string(post.title),
            description: to_c_string(post.description),
            image_url: opt_c_string(post.image_url),
        }
    }
}

impl FfiPost {
    pub(crate) fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.title);
        free_c_string(self.description);
        free_c_string(self.image_url);
    }
}

#[repr(C)]
pub struct FfiPostList {
    pub items: *mut FfiPost,
    pub len: u32,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data`
/// points to the payload named by `data_tag`. On failure `data` is null and
/// `error_message` is a human-readable C string.
#[repr(C)]
pub struct FfiPostResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiPostResult {
    fn new(error_code: FfiErrorCode, message: Option<String>, http_status: u16) -> Self {
        FfiPostResult {
            error_code,
            error_message: opt_c_string(message),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }
    }

    pub(crate) fn ok_post(post: Post) -> *mut Self {
        let mut result = Self::new(FfiErrorCode::Ok, None, 0);
        result.data_tag = FfiDataTag::Post;
        result.data = Box::into_raw(Box::new(FfiPost::from(post))) as *mut c_void;
        Box::into_raw(Box::new(result))
    }

    pub(crate) fn ok_post_list(posts: Vec<Post>) -> *mut Self {
        let (items, len) = into_raw_slice(posts.into_iter().map(FfiPost::from).collect());
        let mut result = Self::new(FfiErrorCode::Ok, None, 0);
        result.data_tag = FfiDataTag::PostList;
        result.data = Box::into_raw(Box::new(FfiPostList { items, len })) as *mut c_void;
        Box::into_raw(Box::new(result))
    }

    /// Success with no payload (delete).
    pub(crate) fn ok_empty() -> *mut Self {
        Box::into_raw(Box::new(Self::new(FfiErrorCode::Ok, None, 0)))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (code, status) = match &err {
            ApiError::NotFound => (FfiErrorCode::NotFound, 404),
            ApiError::Http { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::Deserialization(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
        };
        Box::into_raw(Box::new(Self::new(code, Some(err.to_string()), status)))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = format!("null argument: {name}");
        Box::into_raw(Box::new(Self::new(FfiErrorCode::NullArg, Some(msg), 0)))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Box::into_raw(Box::new(Self::new(FfiErrorCode::Panic, Some(msg.to_string()), 0)))
    }
}
