use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn page_size() -> Option<u64> {
        // Apple Silicon reports 16 KiB here, Intel 4 KiB
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        u64::try_from(size).ok()
    }
}
