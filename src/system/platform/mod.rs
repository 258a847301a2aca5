/// Used when the OS does not report a page size.
pub const FALLBACK_PAGE_SIZE: u64 = 4096;

pub trait PlatformExtensions {
    /// Granularity of physical memory pages, in bytes.
    fn page_size() -> Option<u64>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn page_size() -> u64 {
    platform_impl::Platform::page_size()
        .filter(|&size| size > 0)
        .unwrap_or(FALLBACK_PAGE_SIZE)
}
