/// Errors that can occur while framing or unframing payloads.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the 32-bit length header, or exceeds the
    /// configured receive cap.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before a complete frame was exchanged.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
