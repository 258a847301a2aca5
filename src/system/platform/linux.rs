use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn page_size() -> Option<u64> {
        // sysconf reports -1 when the limit is indeterminate
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        u64::try_from(size).ok()
    }
}
