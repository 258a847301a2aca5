use windows_sys::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};

use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn page_size() -> Option<u64> {
        unsafe {
            let mut info = std::mem::zeroed::<SYSTEM_INFO>();
            GetSystemInfo(&mut info);
            Some(u64::from(info.dwPageSize))
        }
    }
}
