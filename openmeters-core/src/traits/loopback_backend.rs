use crate::models::audio_format::DeviceFormat;
use crate::models::error::CaptureError;

/// One device buffer as handed out by the OS stream.
///
/// `data` is only valid until the matching [`PacketReader::release`].
#[derive(Debug, Clone, Copy)]
pub struct DevicePacket<'a> {
    pub data: &'a [u8],
    pub frames: u32,
    /// The device marked this buffer silent; `data` must not be read.
    pub silent: bool,
}

impl DevicePacket<'static> {
    pub const EMPTY: Self = Self {
        data: &[],
        frames: 0,
        silent: false,
    };
}

impl DevicePacket<'_> {
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

/// Platform entry point for loopback capture of the default render device.
///
/// Implemented by:
/// - `WasapiLoopback` (Windows)
/// - `SyntheticBackend` (in-process, for tests and demos)
pub trait LoopbackBackend: Send + Sync {
    type Client: LoopbackClient;

    /// Start the audio subsystem, locate the default render endpoint and
    /// activate a client on it.
    ///
    /// Every resource acquired here is owned by the returned client and
    /// released when it drops, including on early return.
    fn activate_default_render(&self) -> Result<Self::Client, CaptureError>;
}

/// An activated client on the render endpoint.
pub trait LoopbackClient: Send {
    type Reader: PacketReader;

    /// Query the device mix format.
    fn mix_format(&mut self) -> Result<DeviceFormat, CaptureError>;

    /// Initialize a shared-mode loopback stream in the queried mix format
    /// and acquire its capture client.
    fn initialize_stream(&mut self) -> Result<Self::Reader, CaptureError>;

    /// Start the OS audio stream.
    fn start(&self) -> Result<(), CaptureError>;

    /// Stop the OS audio stream. Buffers already queued stay readable.
    fn stop(&self) -> Result<(), CaptureError>;

    /// Human-readable endpoint name, if the platform reports one.
    fn device_name(&self) -> Option<String> {
        None
    }
}

/// Capture-thread side of an initialized stream.
///
/// Cloned into each capture thread; the clone is dropped when that
/// thread exits.
pub trait PacketReader: Clone + Send + 'static {
    /// Retrieve the next device buffer. Zero frames means nothing is queued;
    /// the empty packet must still be released.
    fn acquire(&mut self) -> Result<DevicePacket<'_>, CaptureError>;

    /// Hand the buffer from the last `acquire` back to the stream.
    fn release(&mut self, frames: u32) -> Result<(), CaptureError>;

    /// Ask the scheduler to run the calling thread at elevated (real-time)
    /// priority. Called once, on the capture thread, before the first read.
    fn elevate_priority(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::PriorityUnavailable)
    }
}
