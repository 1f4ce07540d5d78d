//! Decides whether the tool has to run as the account that owns the site
//! files instead of the caller's own effective user.

/// Account that owns a site's files, with its uid when it resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOwner {
    pub name: String,
    pub uid: Option<u32>,
}

impl SiteOwner {
    pub fn new(name: impl Into<String>, uid: Option<u32>) -> Self {
        Self {
            name: name.into(),
            uid,
        }
    }

    /// Resolves `name` through the system account database.
    pub fn lookup(name: &str) -> Self {
        Self::new(name, uid_for_name(name))
    }
}

/// Prefix that re-runs the tool as `owner`, or `None` to run directly.
///
/// Runs directly when the owner did not resolve (or resolved to root) and
/// when the caller already is the owner.
pub fn elevation_prefix(owner: &SiteOwner, caller_euid: u32) -> Option<Vec<String>> {
    match owner.uid {
        Some(uid) if uid > 0 && uid != caller_euid => Some(vec![
            "sudo".to_string(),
            "-u".to_string(),
            owner.name.clone(),
        ]),
        _ => None,
    }
}

#[cfg(unix)]
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() }
}

#[cfg(not(unix))]
pub fn effective_uid() -> u32 {
    0
}

#[cfg(unix)]
pub fn uid_for_name(name: &str) -> Option<u32> {
    use std::ffi::CString;

    let c_name = CString::new(name).ok()?;
    // SAFETY: `pwd`, `buf` and `result` outlive the call and `buf.len()` is
    // the real buffer size; getpwnam_r only writes within those bounds.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buf = vec![0 as libc::c_char; 16 * 1024];
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let rc = unsafe {
        libc::getpwnam_r(
            c_name.as_ptr(),
            &mut pwd,
            buf.as_mut_ptr(),
            buf.len(),
            &mut result,
        )
    };
    if rc != 0 || result.is_null() {
        return None;
    }
    Some(pwd.pw_uid)
}

#[cfg(not(unix))]
pub fn uid_for_name(_name: &str) -> Option<u32> {
    None
}
