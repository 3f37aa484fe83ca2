//! Error types for driftfield.
//!
//! Configuration problems are caught up front, resource failures are
//! propagated to whoever mounted the engine, and GPU/window failures only
//! concern the bundled wgpu host.

use std::fmt;

/// Invalid engine configuration. Detected at construction and never clamped.
#[derive(Debug)]
pub enum ConfigError {
    /// A count, radius or threshold that must be strictly positive was not.
    NonPositive {
        field: &'static str,
        value: f64,
    },
    /// A numeric field was NaN or infinite.
    NonFinite { field: &'static str },
    /// Pointer smoothing factor outside `(0, 1]`.
    SmoothingOutOfRange(f32),
    /// A custom palette with no colors.
    EmptyPalette,
    /// Viewport with a zero dimension or a non-positive pixel ratio.
    InvalidViewport { width: u32, height: u32 },
    /// JSON configuration could not be parsed.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositive { field, value } => {
                write!(f, "`{}` must be greater than zero (got {})", field, value)
            }
            ConfigError::NonFinite { field } => write!(f, "`{}` must be a finite number", field),
            ConfigError::SmoothingOutOfRange(alpha) => write!(
                f,
                "`smoothing_alpha` must be in (0, 1] (got {}); 0 would freeze the pointer target",
                alpha
            ),
            ConfigError::EmptyPalette => write!(f, "custom palette must contain at least one color"),
            ConfigError::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {}x{}", width, height)
            }
            ConfigError::Parse(e) => write!(f, "failed to parse configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Failure to allocate the glow sprite or a vertex buffer.
#[derive(Debug)]
pub enum ResourceError {
    /// Requested sprite edge length is zero or above [`crate::sprite::MAX_SPRITE_SIZE`].
    SpriteSize { size: u32 },
    /// A buffer would exceed the device's maximum buffer size.
    BufferTooLarge {
        label: &'static str,
        size: u64,
        limit: u64,
    },
    /// The host rejected an allocation.
    Allocation {
        label: &'static str,
        message: String,
    },
    /// The device ran out of memory while presenting.
    OutOfMemory,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::SpriteSize { size } => {
                write!(f, "cannot allocate a {0}x{0} glow sprite", size)
            }
            ResourceError::BufferTooLarge { label, size, limit } => write!(
                f,
                "{} needs {} bytes but the device allows at most {}",
                label, size, limit
            ),
            ResourceError::Allocation { label, message } => {
                write!(f, "failed to allocate {}: {}", label, message)
            }
            ResourceError::OutOfMemory => write!(f, "GPU out of memory"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Empty vector with room for exactly `capacity` elements, or an
/// [`ResourceError::Allocation`] if that much memory cannot be reserved.
pub(crate) fn try_with_capacity<T>(
    label: &'static str,
    capacity: usize,
) -> Result<Vec<T>, ResourceError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(capacity)
        .map_err(|e| ResourceError::Allocation {
            label,
            message: e.to_string(),
        })?;
    Ok(vec)
}

/// Errors that can occur while creating the wgpu host.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors surfaced by [`crate::Scene`] and [`crate::Engine`].
#[derive(Debug)]
pub enum EngineError {
    Config(ConfigError),
    Resource(ResourceError),
    /// Frame requested while the engine is idle or disposed.
    NotRunning,
    /// `start()` called on an engine that already started.
    AlreadyStarted,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "configuration error: {}", e),
            EngineError::Resource(e) => write!(f, "resource error: {}", e),
            EngineError::NotRunning => write!(f, "engine is not running"),
            EngineError::AlreadyStarted => write!(f, "engine was already started"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(e) => Some(e),
            EngineError::Resource(e) => Some(e),
            EngineError::NotRunning | EngineError::AlreadyStarted => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}

impl From<ResourceError> for EngineError {
    fn from(e: ResourceError) -> Self {
        EngineError::Resource(e)
    }
}

/// Errors that can occur when running the windowed demo.
#[derive(Debug)]
pub enum RunError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The engine failed to start or render.
    Engine(EngineError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            RunError::Window(e) => write!(f, "Failed to create window: {}", e),
            RunError::Gpu(e) => write!(f, "GPU error: {}", e),
            RunError::Engine(e) => write!(f, "Engine error: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::EventLoop(e) => Some(e),
            RunError::Window(e) => Some(e),
            RunError::Gpu(e) => Some(e),
            RunError::Engine(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for RunError {
    fn from(e: winit::error::EventLoopError) -> Self {
        RunError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for RunError {
    fn from(e: winit::error::OsError) -> Self {
        RunError::Window(e)
    }
}

impl From<GpuError> for RunError {
    fn from(e: GpuError) -> Self {
        RunError::Gpu(e)
    }
}

impl From<EngineError> for RunError {
    fn from(e: EngineError) -> Self {
        RunError::Engine(e)
    }
}
