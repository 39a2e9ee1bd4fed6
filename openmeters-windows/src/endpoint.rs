//! Default render endpoint lookup via the MMDevice API.

use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::{
    eConsole, eRender, IMMDevice, IMMDeviceEnumerator, MMDeviceEnumerator,
};
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_ALL, STGM_READ};

use openmeters_core::models::error::CaptureError;

/// Create the device enumerator. COM must be usable on the calling thread.
pub fn enumerator() -> Result<IMMDeviceEnumerator, CaptureError> {
    unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }.map_err(|e| {
        log::debug!("MMDeviceEnumerator creation failed: {}", e);
        CaptureError::DeviceNotAvailable
    })
}

/// The default render endpoint; loopback taps what is being played to it.
pub fn default_render(enumerator: &IMMDeviceEnumerator) -> Result<IMMDevice, CaptureError> {
    unsafe { enumerator.GetDefaultAudioEndpoint(eRender, eConsole) }.map_err(|e| {
        log::debug!("GetDefaultAudioEndpoint failed: {}", e);
        CaptureError::DeviceNotAvailable
    })
}

/// Read `PKEY_Device_FriendlyName` from the device property store.
pub fn friendly_name(device: &IMMDevice) -> Option<String> {
    unsafe {
        let store = device.OpenPropertyStore(STGM_READ).ok()?;
        let value = store.GetValue(&PKEY_Device_FriendlyName).ok()?;
        let name = value.to_string();
        (!name.is_empty()).then_some(name)
    }
}
