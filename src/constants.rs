// Centralized constants for the aipack project to avoid magic numbers

/// Buffer size for streaming IO operations (1 MB)
pub const DEFAULT_IO_BUFFER_SIZE: usize = 1024 * 1024;

/// Revision used for Hugging Face downloads when none is given
pub const DEFAULT_HF_REVISION: &str = "main";

/// Base URL for Hugging Face repository access
pub const HF_BASE_URL: &str = "https://huggingface.co";
